//! The supply pipeline.
//!
//! [`Supplier::run`] drives the package manager through a fixed sequence and
//! then exposes what was installed:
//!
//! ```text
//! Setup -> [AddKeys] -> [AddRepos] -> Update -> Download -> Install -> Expose
//! ```
//!
//! Key and repo registration run only when the declaration has keys or
//! repos. Every other step always runs. The first failure ends the run and
//! is returned as is; nothing already written is rolled back.

use crate::apt::Apt;
use crate::error::Result;
use crate::exposure;
use crate::output::begin_step;
use crate::stager::Stager;
use std::fmt;
use std::io::Write;

/// A stage of the supply pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    /// Prepare package-manager state.
    Setup,
    /// Register signing keys.
    AddKeys,
    /// Register additional package sources.
    AddRepos,
    /// Refresh the package index.
    Update,
    /// Fetch declared packages.
    Download,
    /// Unpack fetched packages into the install root.
    Install,
    /// Link and copy installed files into the dependency directory.
    Expose,
}

impl Step {
    /// The step-boundary message shown before the step runs.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Setup => "Setting up apt",
            Self::AddKeys => "Adding apt keys",
            Self::AddRepos => "Adding apt repos",
            Self::Update => "Updating apt cache",
            Self::Download => "Downloading apt packages",
            Self::Install => "Installing apt packages",
            Self::Expose => "Creating Symlinks",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Installs declared apt packages and exposes them to the application.
#[derive(Debug)]
pub struct Supplier<S, A> {
    stager: S,
    apt: A,
}

impl<S: Stager, A: Apt> Supplier<S, A> {
    /// Create a supplier over the given collaborators.
    #[must_use]
    pub const fn new(stager: S, apt: A) -> Self {
        Self { stager, apt }
    }

    /// Run the whole pipeline, writing step boundaries to `out`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any step, unchanged.
    pub fn run(&mut self, out: &mut dyn Write) -> Result<()> {
        run_step(out, Step::Setup, || self.apt.setup())
            .inspect_err(|err| log::error!("Failed to setup apt: {err}"))?;

        if self.apt.has_keys() {
            run_step(out, Step::AddKeys, || self.apt.add_keys())?;
        }

        if self.apt.has_repos() {
            run_step(out, Step::AddRepos, || self.apt.add_repos())?;
        }

        run_step(out, Step::Update, || self.apt.update())?;
        run_step(out, Step::Download, || self.apt.download_all())?;
        run_step(out, Step::Install, || self.apt.install_all())?;
        run_step(out, Step::Expose, || self.create_symlinks())
    }

    /// Expose the install root under the stager's dependency directory.
    ///
    /// # Errors
    ///
    /// Returns the first filesystem or link error.
    pub fn create_symlinks(&self) -> Result<()> {
        exposure::create_symlinks(&self.stager)
    }

    /// The staging collaborator.
    #[cfg(any(test, feature = "test-support"))]
    #[must_use]
    pub const fn stager(&self) -> &S {
        &self.stager
    }

    /// The package-manager collaborator.
    #[cfg(any(test, feature = "test-support"))]
    #[must_use]
    pub const fn apt(&self) -> &A {
        &self.apt
    }
}

fn run_step(out: &mut dyn Write, step: Step, action: impl FnOnce() -> Result<()>) -> Result<()> {
    begin_step(out, step);
    action()
}

#[cfg(test)]
#[path = "supplier_tests.rs"]
mod tests;
