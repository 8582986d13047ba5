//! Copying pkg-config files with a relocated prefix.
//!
//! Packages ship `.pc` files with `prefix=/usr`. Once unpacked under the
//! install root that prefix is wrong, so each copy has the exact line
//! rewritten to point at `<install_root>/usr`.

use crate::error::{FsOperation, Result, SupplyError};
use crate::stager::sorted_entry_names;
use camino::Utf8Path;
use std::fs;

/// The only line the rewrite touches, newline included.
pub const PREFIX_TRIGGER: &[u8] = b"prefix=/usr\n";

/// Rewrites every exact `prefix=/usr` line to the relocated prefix.
///
/// Matching is by whole newline-terminated line: `prefix=/usr/local`,
/// `  prefix=/usr`, and a final `prefix=/usr` without a newline are left
/// alone, as is every other byte. The contents need not be UTF-8.
///
/// # Example
///
/// ```
/// use apt_supply::exposure::rewrite_pkgconfig;
/// use camino::Utf8Path;
///
/// let rewritten = rewrite_pkgconfig(
///     b"prefix=/usr\nName: cups\n",
///     Utf8Path::new("/home/vcap/deps/0/apt"),
/// );
/// assert_eq!(rewritten, b"prefix=/home/vcap/deps/0/apt/usr\nName: cups\n");
/// ```
#[must_use]
pub fn rewrite_pkgconfig(contents: &[u8], install_root: &Utf8Path) -> Vec<u8> {
    let replacement = format!("prefix={}\n", install_root.join("usr"));

    let mut rewritten = Vec::with_capacity(contents.len());
    for line in contents.split_inclusive(|byte| *byte == b'\n') {
        if line == PREFIX_TRIGGER {
            rewritten.extend_from_slice(replacement.as_bytes());
        } else {
            rewritten.extend_from_slice(line);
        }
    }
    rewritten
}

/// Copies every file directly inside `source` into `dest_dir`, rewriting
/// each with [`rewrite_pkgconfig`]. Existing files in `dest_dir` are
/// overwritten. Subdirectories are not descended into.
///
/// Returns the number of files written.
///
/// # Errors
///
/// Returns a read error if `source` or a file in it cannot be read, a mkdir
/// error if `dest_dir` cannot be created, or a write error if a copy cannot
/// be written.
pub fn copy_pkgconfig_dir(
    source: &Utf8Path,
    dest_dir: &Utf8Path,
    install_root: &Utf8Path,
) -> Result<usize> {
    let names = sorted_entry_names(source)?;

    fs::create_dir_all(dest_dir)
        .map_err(|e| SupplyError::filesystem(FsOperation::Mkdir, dest_dir, e))?;

    let mut written = 0;
    for name in names {
        let from = source.join(&name);
        if from.is_dir() {
            log::debug!("skipping directory {from}");
            continue;
        }

        let contents = fs::read(&from)
            .map_err(|e| SupplyError::filesystem(FsOperation::Read, &from, e))?;
        let to = dest_dir.join(&name);
        log::debug!("writing {to}");
        fs::write(&to, rewrite_pkgconfig(&contents, install_root))
            .map_err(|e| SupplyError::filesystem(FsOperation::Write, &to, e))?;
        written += 1;
    }
    Ok(written)
}
