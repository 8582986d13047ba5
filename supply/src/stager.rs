//! Staging directories and dependency-directory linking.
//!
//! The supplier only needs three things from the staging environment: where
//! the dependency output tree lives, where package archives may be cached,
//! and a way to expose a directory of installed files under a well-known
//! name in the output tree. [`Stager`] captures that capability;
//! [`StagingDirs`] implements it with relative symlinks.

use crate::error::{FsOperation, Result, SupplyError};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::fs;

/// Capability interface over the buildpack staging environment.
pub trait Stager {
    /// Returns the dependency output tree root for this buildpack.
    fn dep_dir(&self) -> &Utf8Path;

    /// Returns a scratch directory that survives between staging runs.
    fn cache_dir(&self) -> &Utf8Path;

    /// Exposes every entry of `source` under `<dep_dir>/<dest_name>`.
    ///
    /// # Errors
    ///
    /// Returns a [`SupplyError::Filesystem`] error if the destination cannot
    /// be created, `source` cannot be listed, or a link cannot be made.
    fn link_directory_in_dep_dir(&self, source: &Utf8Path, dest_name: &str) -> Result<()>;
}

/// Staging directories for one buildpack in one staging run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingDirs {
    dep_dir: Utf8PathBuf,
    cache_dir: Utf8PathBuf,
}

impl StagingDirs {
    /// Create staging directories from explicit paths.
    #[must_use]
    pub const fn new(dep_dir: Utf8PathBuf, cache_dir: Utf8PathBuf) -> Self {
        Self { dep_dir, cache_dir }
    }

    /// Create staging directories from the platform's deps layout, where each
    /// buildpack owns `<deps_dir>/<index>`.
    ///
    /// # Example
    ///
    /// ```
    /// use apt_supply::stager::{Stager, StagingDirs};
    /// use camino::Utf8Path;
    ///
    /// let dirs = StagingDirs::from_deps_index(
    ///     Utf8Path::new("/home/vcap/deps"),
    ///     "0",
    ///     Utf8Path::new("/tmp/cache"),
    /// );
    /// assert_eq!(dirs.dep_dir(), "/home/vcap/deps/0");
    /// ```
    #[must_use]
    pub fn from_deps_index(deps_dir: &Utf8Path, index: &str, cache_dir: &Utf8Path) -> Self {
        Self::new(deps_dir.join(index), cache_dir.to_owned())
    }
}

impl Stager for StagingDirs {
    fn dep_dir(&self) -> &Utf8Path {
        &self.dep_dir
    }

    fn cache_dir(&self) -> &Utf8Path {
        &self.cache_dir
    }

    /// Links each entry of `source` into `<dep_dir>/<dest_name>`.
    ///
    /// Linking merges: several sources may share one destination, and an
    /// entry already present under the destination is left in place, so the
    /// first source to provide a name keeps it.
    fn link_directory_in_dep_dir(&self, source: &Utf8Path, dest_name: &str) -> Result<()> {
        let dest_dir = self.dep_dir.join(dest_name);
        fs::create_dir_all(&dest_dir)
            .map_err(|e| SupplyError::filesystem(FsOperation::Mkdir, &dest_dir, e))?;

        for name in sorted_entry_names(source)? {
            let link_path = dest_dir.join(&name);
            if link_path.symlink_metadata().is_ok() {
                log::debug!("keeping existing {link_path}; not linking {source}/{name}");
                continue;
            }

            let target = relative_path(&dest_dir, &source.join(&name));
            symlink(&target, &link_path)
                .map_err(|e| SupplyError::filesystem(FsOperation::Link, &link_path, e))?;
        }

        Ok(())
    }
}

/// Lists the entry names directly inside `dir`, sorted by name.
///
/// Entries whose names are not UTF-8 are skipped with a warning.
pub(crate) fn sorted_entry_names(dir: &Utf8Path) -> Result<Vec<String>> {
    let read_err = |e| SupplyError::filesystem(FsOperation::Read, dir, e);

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        match entry.map_err(read_err)?.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => log::warn!("skipping {dir}/{}: name is not UTF-8", raw.to_string_lossy()),
        }
    }
    names.sort();
    Ok(names)
}

/// Computes the path of `target` relative to the directory `base`.
///
/// Both paths must be expressed from the same starting point (both absolute
/// or both relative to the same directory).
#[must_use]
pub fn relative_path(base: &Utf8Path, target: &Utf8Path) -> Utf8PathBuf {
    let base_parts: Vec<Utf8Component<'_>> = base.components().collect();
    let target_parts: Vec<Utf8Component<'_>> = target.components().collect();

    let common = base_parts
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = Utf8PathBuf::new();
    for _ in base_parts.iter().skip(common) {
        relative.push("..");
    }
    for part in target_parts.iter().skip(common) {
        relative.push(part.as_str());
    }
    relative
}

#[cfg(unix)]
fn symlink(target: &Utf8Path, link: &Utf8Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(_target: &Utf8Path, _link: &Utf8Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "dependency linking requires a Unix host",
    ))
}
