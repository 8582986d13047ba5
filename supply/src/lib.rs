//! Apt supply step for buildpack staging.
//!
//! This crate installs the OS packages an application declares in `apt.yml`
//! and exposes them to the application runtime. The package manager runs
//! against private state under the buildpack cache and unpacks packages into
//! `<dep_dir>/apt`; the exposure step then links `bin`, `lib`, and `include`
//! into the top of the dependency directory and copies pkg-config files with
//! their prefix rewritten.
//!
//! # Modules
//!
//! - [`apt`] - The package-manager capability and its host-tool implementation
//! - [`command`] - External command execution abstraction
//! - [`error`] - Failure classes and their exit statuses
//! - [`exposure`] - Mapping tables, planning, and pkg-config rewriting
//! - [`output`] - Step-boundary output for the staging log
//! - [`stager`] - Staging directories and dependency-directory linking
//! - [`supplier`] - The supply pipeline
//!
//! # Example
//!
//! ```no_run
//! use apt_supply::apt::SystemApt;
//! use apt_supply::exposure::install_root;
//! use apt_supply::stager::{Stager, StagingDirs};
//! use apt_supply::supplier::Supplier;
//! use camino::Utf8Path;
//!
//! let dirs = StagingDirs::from_deps_index(
//!     Utf8Path::new("/tmp/deps"),
//!     "0",
//!     Utf8Path::new("/tmp/cache"),
//! );
//! let apt = SystemApt::new(
//!     "/tmp/app/apt.yml".into(),
//!     dirs.cache_dir(),
//!     install_root(dirs.dep_dir()),
//! );
//!
//! let mut supplier = Supplier::new(dirs, apt);
//! if let Err(err) = supplier.run(&mut std::io::stdout()) {
//!     std::process::exit(err.exit_code());
//! }
//! ```

pub mod apt;
pub mod command;
pub mod error;
pub mod exposure;
pub mod output;
pub mod stager;
pub mod supplier;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
