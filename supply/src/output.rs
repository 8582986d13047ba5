//! Staging log output.
//!
//! Buildpack output is read by people watching a push, so step boundaries
//! use the platform's `----->` marker. Writes are best effort: a closed
//! output stream never fails the staging run.

use std::fmt::Display;
use std::io::Write;

/// Marker that starts every step-boundary line.
pub const STEP_MARKER: &str = "----->";

/// Writes a step-boundary line.
///
/// # Example
///
/// ```
/// use apt_supply::output::begin_step;
///
/// let mut out = Vec::new();
/// begin_step(&mut out, "Updating apt cache");
/// assert_eq!(String::from_utf8_lossy(&out), "-----> Updating apt cache\n");
/// ```
pub fn begin_step(out: &mut dyn Write, message: impl Display) {
    write_line(out, format_args!("{STEP_MARKER} {message}"));
}

/// Writes a single line of output.
pub fn write_line(out: &mut dyn Write, message: impl Display) {
    if writeln!(out, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}
