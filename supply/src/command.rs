//! External command execution.
//!
//! The apt collaborator drives `apt-get`, `apt-key`, `curl`, and `dpkg`
//! through [`CommandExecutor`] so the command lines can be verified without
//! touching the host package manager.

use std::process::{Command, Output};

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use apt_supply::command::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("apt-get", &["--version".to_owned()])?;
    /// assert!(output.status.success());
    /// # Ok::<(), std::io::Error>(())
    /// ```
    fn run(&self, cmd: &str, args: &[String]) -> std::io::Result<Output>;
}

/// Executes commands on the host system from the filesystem root.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[String]) -> std::io::Result<Output> {
        Command::new(cmd).args(args).current_dir("/").output()
    }
}

/// Runs a command and converts spawn failures and non-zero exits into a
/// single failure description.
///
/// The description carries the command's stderr (or stdout when stderr is
/// empty) so callers can wrap it in the error class of their step.
pub(crate) fn run_checked(
    executor: &dyn CommandExecutor,
    cmd: &str,
    args: &[String],
) -> std::result::Result<Output, String> {
    log::debug!("running: {cmd} {}", args.join(" "));

    let output = executor
        .run(cmd, args)
        .map_err(|e| format!("could not run {cmd}: {e}"))?;

    if output.status.success() {
        return Ok(output);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_owned()
    } else {
        stderr.trim().to_owned()
    };
    Err(format!("{cmd} exited with {}: {detail}", output.status))
}
