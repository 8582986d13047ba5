//! Shared test utilities for the supply crate.

use crate::command::CommandExecutor;
use crate::error::{FsOperation, Result, SupplyError};
use crate::output::STEP_MARKER;
use crate::stager::Stager;
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "apt-get").
    pub cmd: &'static str,
    /// The trailing arguments the invocation must end with.
    ///
    /// apt-get invocations carry a long prefix of `-o` options; matching on
    /// the tail keeps expectations readable.
    pub args_suffix: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: std::io::Result<Output>,
}

impl ExpectedCall {
    /// Expect `cmd` ending with `args_suffix` and let it succeed.
    #[must_use]
    pub fn succeeds(cmd: &'static str, args_suffix: &[&str]) -> Self {
        Self {
            cmd,
            args_suffix: args_suffix.iter().map(|arg| (*arg).to_owned()).collect(),
            result: Ok(success_output()),
        }
    }

    /// Expect `cmd` ending with `args_suffix` and let it exit non-zero with
    /// `stderr`.
    #[must_use]
    pub fn fails(cmd: &'static str, args_suffix: &[&str], stderr: &str) -> Self {
        Self {
            result: Ok(failure_output(stderr)),
            ..Self::succeeds(cmd, args_suffix)
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[String]) -> std::io::Result<Output> {
        let mut expected = self.expected.borrow_mut();
        let call = expected
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected command invocation: {cmd} {args:?}"));

        assert_eq!(call.cmd, cmd);
        assert!(
            args.ends_with(&call.args_suffix),
            "{cmd} {args:?} does not end with {:?}",
            call.args_suffix
        );

        call.result
    }
}

/// A stager that records link requests instead of creating links.
#[derive(Debug)]
pub struct RecordingStager {
    dep_dir: Utf8PathBuf,
    cache_dir: Utf8PathBuf,
    fail_dest: Option<String>,
    links: RefCell<Vec<(Utf8PathBuf, String)>>,
}

impl RecordingStager {
    /// Creates a stager rooted at `dep_dir` with a sibling cache directory.
    #[must_use]
    pub fn new(dep_dir: &Utf8Path) -> Self {
        Self {
            dep_dir: dep_dir.to_owned(),
            cache_dir: dep_dir.join("cache"),
            fail_dest: None,
            links: RefCell::new(Vec::new()),
        }
    }

    /// Makes link requests for `dest` fail with a link error.
    #[must_use]
    pub fn failing_on(mut self, dest: &str) -> Self {
        self.fail_dest = Some(dest.to_owned());
        self
    }

    /// Returns the recorded `(source, dest)` link requests in order.
    #[must_use]
    pub fn links(&self) -> Vec<(Utf8PathBuf, String)> {
        self.links.borrow().clone()
    }

    /// Returns the destinations of the recorded link requests in order.
    #[must_use]
    pub fn link_dests(&self) -> Vec<String> {
        self.links.borrow().iter().map(|(_, dest)| dest.clone()).collect()
    }
}

impl Stager for RecordingStager {
    fn dep_dir(&self) -> &Utf8Path {
        &self.dep_dir
    }

    fn cache_dir(&self) -> &Utf8Path {
        &self.cache_dir
    }

    fn link_directory_in_dep_dir(&self, source: &Utf8Path, dest_name: &str) -> Result<()> {
        self.links
            .borrow_mut()
            .push((source.to_owned(), dest_name.to_owned()));

        if self.fail_dest.as_deref() == Some(dest_name) {
            return Err(SupplyError::filesystem(
                FsOperation::Link,
                self.dep_dir.join(dest_name),
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ));
        }
        Ok(())
    }
}

/// Extracts the step messages from captured output, in order.
#[must_use]
pub fn step_messages(output: &str) -> Vec<&str> {
    output
        .lines()
        .filter_map(|line| line.strip_prefix(STEP_MARKER))
        .map(str::trim_start)
        .collect()
}
