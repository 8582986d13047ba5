//! Test support utilities for supply integration tests.
//!
//! [`Staging`] lays out a throwaway staging environment: an application
//! directory holding `apt.yml`, a host apt root, a buildpack cache, and a
//! dependency directory at index `0`.

use apt_supply::apt::{AptLayout, SystemApt};
use apt_supply::exposure::install_root;
use apt_supply::stager::StagingDirs;
use apt_supply::supplier::Supplier;
use apt_supply::test_utils::{ExpectedCall, StubExecutor};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// Seeded host `sources.list`.
pub const HOST_SOURCES: &str = "deb http://archive.ubuntu.com/ubuntu jammy main\n";

/// A supplier wired to stubbed host tools and real staging directories.
pub type StubSupplier = Supplier<StagingDirs, SystemApt<StubExecutor>>;

/// A temporary staging environment.
pub struct Staging {
    _temp: TempDir,
    root: Utf8PathBuf,
}

impl Staging {
    /// Creates the environment with `apt_yml` as the application's
    /// declaration.
    pub fn new(apt_yml: &str) -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        let root =
            Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("temp dir path not UTF-8");

        fs::create_dir_all(root.join("app")).expect("failed to create app dir");
        fs::write(root.join("app").join("apt.yml"), apt_yml).expect("failed to write apt.yml");
        fs::create_dir_all(root.join("etc-apt")).expect("failed to create apt root");
        fs::write(root.join("etc-apt").join("sources.list"), HOST_SOURCES)
            .expect("failed to write sources.list");
        fs::create_dir_all(root.join("deps").join("0")).expect("failed to create dep dir");

        Self { _temp: temp, root }
    }

    /// The dependency directory.
    pub fn dep_dir(&self) -> Utf8PathBuf {
        self.root.join("deps").join("0")
    }

    /// The buildpack cache directory.
    pub fn cache_dir(&self) -> Utf8PathBuf {
        self.root.join("cache")
    }

    /// Where packages are unpacked.
    pub fn install_root(&self) -> Utf8PathBuf {
        install_root(&self.dep_dir())
    }

    /// Where downloaded archives are kept.
    pub fn archives_dir(&self) -> Utf8PathBuf {
        AptLayout::under(&self.cache_dir()).archives_dir()
    }

    /// Drops an empty `.deb` into the archive directory, as a download would.
    pub fn place_archive(&self, name: &str) {
        let archives = self.archives_dir();
        fs::create_dir_all(&archives).expect("failed to create archives dir");
        fs::write(archives.join(name), "").expect("failed to write archive");
    }

    /// Writes a file into the install root, as unpacking a package would.
    pub fn install_file(&self, rel: &str, contents: &str) {
        write_file(&self.install_root().join(rel), contents);
    }

    /// Builds a supplier whose host tools answer `calls` in order.
    pub fn supplier(&self, calls: Vec<ExpectedCall>) -> StubSupplier {
        let dirs = StagingDirs::new(self.dep_dir(), self.cache_dir());
        let apt = SystemApt::with_executor(
            StubExecutor::new(calls),
            self.root.join("app").join("apt.yml"),
            &self.cache_dir(),
            self.install_root(),
        )
        .with_apt_root(self.root.join("etc-apt"));
        Supplier::new(dirs, apt)
    }
}

/// Writes `contents` to `path`, creating parent directories.
pub fn write_file(path: &Utf8Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create parent dir");
    }
    fs::write(path, contents).expect("failed to write file");
}
