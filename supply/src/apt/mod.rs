//! The package-manager collaborator.
//!
//! [`Apt`] is the capability the supplier drives: prepare state, register
//! keys and sources, refresh the index, fetch packages, and unpack them into
//! the install root. [`SystemApt`] implements it on top of the host's
//! `apt-get`, `apt-key`, `curl`, and `dpkg`.

mod config;
mod system;

pub use config::AptFile;
pub use system::{AptLayout, DEFAULT_APT_ROOT, SystemApt};

use crate::error::Result;

/// Capability interface over the package manager.
#[cfg_attr(test, mockall::automock)]
pub trait Apt {
    /// Prepares package-manager state. Safe to repeat across retries.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SupplyError::Setup`] on failure.
    fn setup(&mut self) -> Result<()>;

    /// Returns `true` when signing keys are declared.
    fn has_keys(&self) -> bool;

    /// Returns `true` when additional package sources are declared.
    fn has_repos(&self) -> bool;

    /// Registers the declared signing keys.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SupplyError::Keys`] on failure.
    fn add_keys(&mut self) -> Result<()>;

    /// Registers the declared package sources.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SupplyError::Repos`] on failure.
    fn add_repos(&mut self) -> Result<()>;

    /// Refreshes the package index.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SupplyError::Update`] on failure.
    fn update(&mut self) -> Result<()>;

    /// Fetches every declared package into the local archive cache.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SupplyError::Download`] on failure.
    fn download_all(&mut self) -> Result<()>;

    /// Unpacks every fetched package into the install root.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SupplyError::Install`] on failure.
    fn install_all(&mut self) -> Result<()>;
}
