//! [`Apt`] on top of the host package tools.
//!
//! All package-manager state lives under the buildpack cache directory so
//! the host's own apt state is never touched: apt-get is pointed at private
//! cache, state, sources, and keyring locations on every invocation.

use super::{Apt, AptFile};
use crate::command::{CommandExecutor, SystemCommandExecutor, run_checked};
use crate::error::{Result, SupplyError};
use crate::stager::sorted_entry_names;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::Write;

/// Location of the host's apt configuration.
pub const DEFAULT_APT_ROOT: &str = "/etc/apt";

const KEYSERVER: &str = "keyserver.ubuntu.com";

/// Private apt directories under the buildpack cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AptLayout {
    /// Package cache (`dir::cache`); archives land in `archives/`.
    pub cache_dir: Utf8PathBuf,
    /// Package index state (`dir::state`).
    pub state_dir: Utf8PathBuf,
    /// Private `sources.list`.
    pub source_list: Utf8PathBuf,
    /// Private trusted keyring.
    pub trusted_keys: Utf8PathBuf,
}

impl AptLayout {
    /// Lay out apt state under `<cache_root>/apt`.
    ///
    /// # Example
    ///
    /// ```
    /// use apt_supply::apt::AptLayout;
    /// use camino::Utf8Path;
    ///
    /// let layout = AptLayout::under(Utf8Path::new("/tmp/cache"));
    /// assert_eq!(layout.archives_dir(), "/tmp/cache/apt/cache/archives");
    /// assert_eq!(layout.source_list, "/tmp/cache/apt/sources/sources.list");
    /// ```
    #[must_use]
    pub fn under(cache_root: &Utf8Path) -> Self {
        let apt = cache_root.join("apt");
        Self {
            cache_dir: apt.join("cache"),
            state_dir: apt.join("state"),
            source_list: apt.join("sources").join("sources.list"),
            trusted_keys: apt.join("etc").join("trusted.gpg"),
        }
    }

    /// Directory holding downloaded `.deb` archives.
    #[must_use]
    pub fn archives_dir(&self) -> Utf8PathBuf {
        self.cache_dir.join("archives")
    }

    /// The `-o` options passed to every apt-get invocation.
    #[must_use]
    pub fn apt_get_options(&self) -> Vec<String> {
        vec![
            "-o".to_owned(),
            "debug::nolocking=true".to_owned(),
            "-o".to_owned(),
            format!("dir::cache={}", self.cache_dir),
            "-o".to_owned(),
            format!("dir::state={}", self.state_dir),
            "-o".to_owned(),
            format!("dir::etc::sourcelist={}", self.source_list),
            "-o".to_owned(),
            format!("dir::etc::trusted={}", self.trusted_keys),
        ]
    }
}

/// Package manager backed by `apt-get`, `apt-key`, `curl`, and `dpkg`.
#[derive(Debug)]
pub struct SystemApt<E = SystemCommandExecutor> {
    executor: E,
    apt_file: Utf8PathBuf,
    apt_root: Utf8PathBuf,
    layout: AptLayout,
    install_root: Utf8PathBuf,
    declaration: AptFile,
}

impl SystemApt {
    /// Create an apt driver that runs the host's tools.
    ///
    /// `apt_file` is the application's `apt.yml`; it is read during
    /// [`Apt::setup`]. Packages are unpacked into `install_root`.
    #[must_use]
    pub fn new(apt_file: Utf8PathBuf, cache_root: &Utf8Path, install_root: Utf8PathBuf) -> Self {
        Self::with_executor(SystemCommandExecutor, apt_file, cache_root, install_root)
    }
}

impl<E: CommandExecutor> SystemApt<E> {
    /// Create an apt driver that runs commands through `executor`.
    #[must_use]
    pub fn with_executor(
        executor: E,
        apt_file: Utf8PathBuf,
        cache_root: &Utf8Path,
        install_root: Utf8PathBuf,
    ) -> Self {
        Self {
            executor,
            apt_file,
            apt_root: Utf8PathBuf::from(DEFAULT_APT_ROOT),
            layout: AptLayout::under(cache_root),
            install_root,
            declaration: AptFile::default(),
        }
    }

    /// Seed the private sources list and keyring from `apt_root` instead of
    /// [`DEFAULT_APT_ROOT`].
    #[must_use]
    pub fn with_apt_root(mut self, apt_root: Utf8PathBuf) -> Self {
        self.apt_root = apt_root;
        self
    }

    /// The declaration loaded by [`Apt::setup`].
    #[must_use]
    pub const fn declaration(&self) -> &AptFile {
        &self.declaration
    }

    /// The private apt directories.
    #[must_use]
    pub const fn layout(&self) -> &AptLayout {
        &self.layout
    }

    /// Where packages are unpacked.
    #[must_use]
    pub fn install_root(&self) -> &Utf8Path {
        &self.install_root
    }

    /// The command executor.
    #[cfg(any(test, feature = "test-support"))]
    #[must_use]
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    fn run(&self, cmd: &str, args: &[String]) -> std::result::Result<(), String> {
        let output = run_checked(&self.executor, cmd, args)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            log::debug!("{cmd}: {}", stdout.trim_end());
        }
        Ok(())
    }

    fn apt_get(&self, args: &[&str]) -> std::result::Result<(), String> {
        let mut full = self.layout.apt_get_options();
        full.extend(args.iter().map(|arg| (*arg).to_owned()));
        self.run("apt-get", &full)
    }

    fn prepare_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(self.layout.archives_dir())?;
        fs::create_dir_all(self.layout.state_dir.join("lists").join("partial"))?;
        for file in [&self.layout.source_list, &self.layout.trusted_keys] {
            if let Some(parent) = file.parent() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    fn seed_from_apt_root(&self) -> std::io::Result<()> {
        let host_sources = self.apt_root.join("sources.list");
        if host_sources.is_file() {
            fs::copy(&host_sources, &self.layout.source_list)?;
        } else if !self.layout.source_list.exists() {
            fs::write(&self.layout.source_list, "")?;
        }

        let host_keys = self.apt_root.join("trusted.gpg");
        if host_keys.is_file() {
            fs::copy(&host_keys, &self.layout.trusted_keys)?;
        }
        Ok(())
    }
}

impl<E: CommandExecutor> Apt for SystemApt<E> {
    fn setup(&mut self) -> Result<()> {
        let setup_err = |e: std::io::Error| SupplyError::Setup {
            reason: e.to_string(),
        };
        self.prepare_directories().map_err(setup_err)?;
        self.seed_from_apt_root().map_err(setup_err)?;
        self.declaration = AptFile::load(&self.apt_file)?;

        log::info!(
            "apt.yml declares {} package(s), {} key(s), {} repo(s)",
            self.declaration.packages.len(),
            self.declaration.keys.len() + self.declaration.gpg_advanced_keys.len(),
            self.declaration.repos.len()
        );
        Ok(())
    }

    fn has_keys(&self) -> bool {
        !self.declaration.keys.is_empty() || !self.declaration.gpg_advanced_keys.is_empty()
    }

    fn has_repos(&self) -> bool {
        !self.declaration.repos.is_empty()
    }

    fn add_keys(&mut self) -> Result<()> {
        let keyring = self.layout.trusted_keys.to_string();

        for url in &self.declaration.keys {
            let args = [
                "--keyring".to_owned(),
                keyring.clone(),
                "adv".to_owned(),
                "--fetch-keys".to_owned(),
                url.clone(),
            ];
            self.run("apt-key", &args)
                .map_err(|reason| SupplyError::Keys {
                    key: url.clone(),
                    reason,
                })?;
        }

        for id in &self.declaration.gpg_advanced_keys {
            let args = [
                "--keyring".to_owned(),
                keyring.clone(),
                "adv".to_owned(),
                "--keyserver".to_owned(),
                KEYSERVER.to_owned(),
                "--recv-keys".to_owned(),
                id.clone(),
            ];
            self.run("apt-key", &args)
                .map_err(|reason| SupplyError::Keys {
                    key: id.clone(),
                    reason,
                })?;
        }

        Ok(())
    }

    fn add_repos(&mut self) -> Result<()> {
        let repos_err = |e: std::io::Error| SupplyError::Repos {
            reason: format!("{}: {e}", self.layout.source_list),
        };

        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(&self.layout.source_list)
            .map_err(repos_err)?;
        for repo in &self.declaration.repos {
            log::info!("adding apt source: {repo}");
            write!(file, "\n{repo}").map_err(repos_err)?;
        }
        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        self.apt_get(&["update"])
            .map_err(|reason| SupplyError::Update { reason })
    }

    fn download_all(&mut self) -> Result<()> {
        let archives = self.layout.archives_dir();

        for url in self.declaration.deb_urls() {
            let file_name = url.rsplit('/').next().unwrap_or(url);
            let target = archives.join(file_name).to_string();
            let args = [
                "-s".to_owned(),
                "-L".to_owned(),
                "-z".to_owned(),
                target.clone(),
                "-o".to_owned(),
                target,
                url.to_owned(),
            ];
            self.run("curl", &args)
                .map_err(|reason| SupplyError::Download { reason })?;
        }

        let packages: Vec<&str> = self.declaration.repo_packages().collect();
        if packages.is_empty() {
            return Ok(());
        }

        let mut args = vec!["-y", "--force-yes", "-d", "install", "--reinstall"];
        args.extend(packages);
        self.apt_get(&args)
            .map_err(|reason| SupplyError::Download { reason })
    }

    fn install_all(&mut self) -> Result<()> {
        let archives = self.layout.archives_dir();
        if !archives.is_dir() {
            log::info!("no package archives in {archives}");
            return Ok(());
        }

        let debs = sorted_entry_names(&archives).map_err(|e| SupplyError::Install {
            reason: e.to_string(),
        })?;
        let install_root = self.install_root.to_string();

        for deb in debs.iter().filter(|name| name.ends_with(".deb")) {
            let args = [
                "-x".to_owned(),
                archives.join(deb).to_string(),
                install_root.clone(),
            ];
            self.run("dpkg", &args)
                .map_err(|reason| SupplyError::Install { reason })?;
        }
        Ok(())
    }
}
