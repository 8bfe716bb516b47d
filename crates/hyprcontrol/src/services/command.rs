//! Subprocess execution for the external control tools.
//!
//! Every panel action ultimately shells out to `nmcli`, `bluetoothctl`,
//! `pactl` or `brightnessctl` and reads the text they print. Commands are
//! run as argument vectors (never through `sh -c`), so user-supplied SSIDs
//! and passwords reach the tool as literal arguments.

use std::process::Command;

use tracing::warn;

/// External tools the panels depend on.
pub const REQUIRED_TOOLS: [&str; 4] = ["nmcli", "bluetoothctl", "pactl", "brightnessctl"];

/// Run a command and capture its combined stdout+stderr as text.
///
/// Returns `None` only when the process could not be spawned; a command
/// that ran and printed nothing yields `Some("")`. Exit status is ignored;
/// callers classify success from the output text. No timeout: a hanging
/// tool hangs the calling thread.
pub fn run(program: &str, args: &[&str]) -> Option<String> {
    match Command::new(program).args(args).output() {
        Ok(output) => {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            if !output.stderr.is_empty() {
                text.push_str(&String::from_utf8_lossy(&output.stderr));
            }
            Some(text)
        }
        Err(e) => {
            warn!("Failed to spawn {}: {}", program, e);
            None
        }
    }
}

/// Check which of the required external tools are missing from `$PATH`.
pub fn missing_tools() -> Vec<&'static str> {
    REQUIRED_TOOLS
        .into_iter()
        .filter(|tool| which::which(tool).is_err())
        .collect()
}
