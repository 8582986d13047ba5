//! Error types for the apt supply step.
//!
//! Each variant corresponds to one failure class of the staging pipeline.
//! Errors are never recovered inside the crate; the hosting process maps
//! them to exit statuses with [`SupplyError::exit_code`].

use camino::Utf8PathBuf;
use std::fmt;
use thiserror::Error;

/// Filesystem operation that failed during staging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOperation {
    /// Reading a file, a directory listing, or path metadata.
    Read,
    /// Writing a file.
    Write,
    /// Creating a directory.
    Mkdir,
    /// Creating a symlink in the dependency directory.
    Link,
}

impl fmt::Display for FsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Mkdir => "mkdir",
            Self::Link => "link",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while supplying apt packages.
#[derive(Debug, Error)]
pub enum SupplyError {
    /// Preparing the package manager state failed.
    #[error("failed to set up apt: {reason}")]
    Setup {
        /// Description of the setup failure.
        reason: String,
    },

    /// Registering a signing key failed.
    #[error("could not add apt key {key}: {reason}")]
    Keys {
        /// The key URL or key id being added.
        key: String,
        /// Description of the failure.
        reason: String,
    },

    /// Registering an additional package source failed.
    #[error("could not add apt repos: {reason}")]
    Repos {
        /// Description of the failure.
        reason: String,
    },

    /// Refreshing the package index failed.
    #[error("failed to apt-get update: {reason}")]
    Update {
        /// Description of the failure.
        reason: String,
    },

    /// Fetching declared packages failed.
    #[error("failed to download apt packages: {reason}")]
    Download {
        /// Description of the failure.
        reason: String,
    },

    /// Unpacking a fetched package into the install root failed.
    #[error("failed to install apt packages: {reason}")]
    Install {
        /// Description of the failure.
        reason: String,
    },

    /// A filesystem operation failed.
    #[error("{operation} failed for {path}")]
    Filesystem {
        /// The kind of operation attempted.
        operation: FsOperation,
        /// The path the operation targeted.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl SupplyError {
    /// Builds a [`SupplyError::Filesystem`] error.
    pub fn filesystem(
        operation: FsOperation,
        path: impl Into<Utf8PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Filesystem {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Returns the process exit status for this failure class.
    ///
    /// Every class maps to a distinct non-zero status so the platform can
    /// tell which stage of the supply step failed.
    ///
    /// # Example
    ///
    /// ```
    /// use apt_supply::error::SupplyError;
    ///
    /// let err = SupplyError::Update { reason: "no network".to_owned() };
    /// assert_eq!(err.exit_code(), 22);
    /// ```
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Setup { .. } => 13,
            Self::Filesystem { .. } => 14,
            Self::Keys { .. } => 20,
            Self::Repos { .. } => 21,
            Self::Update { .. } => 22,
            Self::Download { .. } => 23,
            Self::Install { .. } => 24,
        }
    }
}

/// Result type alias using [`SupplyError`].
pub type Result<T> = std::result::Result<T, SupplyError>;
