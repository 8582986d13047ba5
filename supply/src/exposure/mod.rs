//! Exposing installed packages to the application runtime.
//!
//! Packages are unpacked under the install root (`<dep_dir>/apt`). Exposure
//! makes them visible at the top of the dependency directory: binaries,
//! libraries, and headers are linked into `bin`, `lib`, and `include`, and
//! pkg-config files are copied into `pkgconfig` with their `prefix` pointed
//! at the install root.
//!
//! The work is split in three: [`probe_install_root`] looks at the
//! filesystem, [`plan_exposure`] turns what it found into actions without
//! touching the filesystem, and [`apply`] carries the actions out.

mod pkgconfig;

pub use pkgconfig::{PREFIX_TRIGGER, copy_pkgconfig_dir, rewrite_pkgconfig};

use crate::error::{FsOperation, Result, SupplyError};
use crate::stager::Stager;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeSet;

/// Directory under the dependency directory that packages are unpacked into.
pub const INSTALL_DIR_NAME: &str = "apt";

/// A source directory under the install root and the output name it is
/// exposed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    /// Path relative to the install root.
    pub source: &'static str,
    /// Name of the destination directory under the dependency directory.
    pub dest: &'static str,
}

const fn mapping(source: &'static str, dest: &'static str) -> Mapping {
    Mapping { source, dest }
}

/// Directories linked into the dependency directory, in link order.
pub const LINK_MAPPINGS: [Mapping; 6] = [
    mapping("usr/bin", "bin"),
    mapping("usr/lib", "lib"),
    mapping("usr/lib/i386-linux-gnu", "lib"),
    mapping("usr/lib/x86_64-linux-gnu", "lib"),
    mapping("lib/x86_64-linux-gnu", "lib"),
    mapping("usr/include", "include"),
];

/// Pkg-config directories copied into the dependency directory, in copy
/// order. Later entries overwrite same-named files from earlier ones.
pub const PKGCONFIG_MAPPINGS: [Mapping; 3] = [
    mapping("usr/lib/i386-linux-gnu/pkgconfig", "pkgconfig"),
    mapping("usr/lib/x86_64-linux-gnu/pkgconfig", "pkgconfig"),
    mapping("usr/lib/pkgconfig", "pkgconfig"),
];

/// Returns the install root for a dependency directory.
#[must_use]
pub fn install_root(dep_dir: &Utf8Path) -> Utf8PathBuf {
    dep_dir.join(INSTALL_DIR_NAME)
}

/// One step of the exposure pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExposureAction {
    /// Ask the stager to link `source` under `dest`.
    Link {
        /// Absolute source directory.
        source: Utf8PathBuf,
        /// Destination name under the dependency directory.
        dest: &'static str,
    },
    /// Copy the pkg-config files in `source` into `dest_dir`, rewriting
    /// their prefix.
    CopyPkgConfig {
        /// Absolute source directory.
        source: Utf8PathBuf,
        /// Absolute destination directory.
        dest_dir: Utf8PathBuf,
    },
}

/// Returns the mapping sources that exist under `install_root`.
///
/// # Errors
///
/// Returns a read error if existence cannot be determined, for example
/// because a parent directory is not searchable.
pub fn probe_install_root(install_root: &Utf8Path) -> Result<BTreeSet<&'static str>> {
    let mut present = BTreeSet::new();
    for entry in LINK_MAPPINGS.iter().chain(&PKGCONFIG_MAPPINGS) {
        let path = install_root.join(entry.source);
        let exists = path
            .as_std_path()
            .try_exists()
            .map_err(|e| SupplyError::filesystem(FsOperation::Read, &path, e))?;
        if exists {
            present.insert(entry.source);
        }
    }
    Ok(present)
}

/// Plans the exposure pass for the sources in `present`.
///
/// All link actions come first, then all pkg-config copies, each in table
/// order. Sources missing from `present` produce no action.
///
/// # Example
///
/// ```
/// use apt_supply::exposure::{ExposureAction, plan_exposure};
/// use camino::Utf8Path;
/// use std::collections::BTreeSet;
///
/// let present = BTreeSet::from(["usr/bin"]);
/// let actions = plan_exposure(&present, Utf8Path::new("/deps/0"));
/// assert_eq!(
///     actions,
///     [ExposureAction::Link {
///         source: "/deps/0/apt/usr/bin".into(),
///         dest: "bin",
///     }]
/// );
/// ```
#[must_use]
pub fn plan_exposure(present: &BTreeSet<&str>, dep_dir: &Utf8Path) -> Vec<ExposureAction> {
    let root = install_root(dep_dir);

    let links = LINK_MAPPINGS
        .iter()
        .filter(|entry| present.contains(entry.source))
        .map(|entry| ExposureAction::Link {
            source: root.join(entry.source),
            dest: entry.dest,
        });

    let copies = PKGCONFIG_MAPPINGS
        .iter()
        .filter(|entry| present.contains(entry.source))
        .map(|entry| ExposureAction::CopyPkgConfig {
            source: root.join(entry.source),
            dest_dir: dep_dir.join(entry.dest),
        });

    links.chain(copies).collect()
}

/// Carries out planned actions in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the first error from the stager or from a pkg-config copy.
pub fn apply(actions: &[ExposureAction], stager: &dyn Stager) -> Result<()> {
    let root = install_root(stager.dep_dir());

    for action in actions {
        match action {
            ExposureAction::Link { source, dest } => {
                log::info!("linking {source} into {dest}");
                stager.link_directory_in_dep_dir(source, dest)?;
            }
            ExposureAction::CopyPkgConfig { source, dest_dir } => {
                log::info!("copying pkg-config files from {source} to {dest_dir}");
                copy_pkgconfig_dir(source, dest_dir, &root)?;
            }
        }
    }
    Ok(())
}

/// Exposes everything installed under the stager's install root.
///
/// # Errors
///
/// Returns the first probe, link, read, mkdir, or write error.
pub fn create_symlinks(stager: &dyn Stager) -> Result<()> {
    let present = probe_install_root(&install_root(stager.dep_dir()))?;
    let actions = plan_exposure(&present, stager.dep_dir());
    apply(&actions, stager)
}

#[cfg(test)]
mod tests;
