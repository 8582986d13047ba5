//! The `apt.yml` package declaration.

use crate::error::{Result, SupplyError};
use camino::Utf8Path;
use serde::Deserialize;

/// Packages, keys, and sources declared by the application in `apt.yml`.
///
/// Every list is optional in the file and defaults to empty.
///
/// # Example
///
/// ```
/// use apt_supply::apt::AptFile;
///
/// let file = AptFile::from_yaml("---\npackages:\n- cups\n- cups-client\n")?;
/// assert_eq!(file.packages, ["cups", "cups-client"]);
/// assert!(file.keys.is_empty());
/// # Ok::<(), apt_supply::error::SupplyError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AptFile {
    /// Package names, or URLs of standalone `.deb` files.
    pub packages: Vec<String>,
    /// URLs of ASCII-armoured signing keys.
    pub keys: Vec<String>,
    /// Key ids to receive from the Ubuntu keyserver.
    pub gpg_advanced_keys: Vec<String>,
    /// Additional `sources.list` lines.
    pub repos: Vec<String>,
}

impl AptFile {
    /// Parse a package declaration from YAML.
    ///
    /// An empty document yields an empty declaration.
    ///
    /// # Errors
    ///
    /// Returns [`SupplyError::Setup`] if the YAML is malformed.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str::<Option<Self>>(yaml)
            .map(Option::unwrap_or_default)
            .map_err(|e| SupplyError::Setup {
                reason: format!("invalid apt.yml: {e}"),
            })
    }

    /// Load a package declaration from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SupplyError::Setup`] if the file cannot be read or parsed.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| SupplyError::Setup {
            reason: format!("could not read {path}: {e}"),
        })?;
        Self::from_yaml(&contents)
    }

    /// Returns the declared `.deb` URLs, in declaration order.
    pub fn deb_urls(&self) -> impl Iterator<Item = &str> {
        self.packages
            .iter()
            .map(String::as_str)
            .filter(|pkg| pkg.ends_with(".deb"))
    }

    /// Returns the declared repository package names, in declaration order.
    ///
    /// Blank entries are ignored.
    pub fn repo_packages(&self) -> impl Iterator<Item = &str> {
        self.packages
            .iter()
            .map(String::as_str)
            .filter(|pkg| !pkg.is_empty() && !pkg.ends_with(".deb"))
    }
}
