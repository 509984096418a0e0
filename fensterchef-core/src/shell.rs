//! The shell-delegation seam for `run`/`show run` (spec.md §4.E "`run
//! S`, `show run S`, `show message S` delegate to the shell runner and
//! the notification collaborator").
//!
//! Grounded in `original_source/src/utility/run_shell.c`'s two entry
//! points: `run_shell` double-forks, detaches with `setsid`, and
//! `execl`s `/bin/sh -c command` without waiting on the result, while
//! `run_shell_and_get_output` pipes the child's stdout and keeps only
//! its first line. Promoted to a trait exactly like
//! [`crate::display::Display`], so `fensterchef-core` never links
//! `std::process` itself -- only the bin crate's implementation does,
//! built on `std::process::Command` the way the teacher's own
//! `pgwm/src/manager/spawn.rs` spawns detached children (`Stdio::null()`
//! on every standard stream).

pub trait ShellRunner: std::any::Any {
    /// Runs `command` through `/bin/sh -c` in the background and does
    /// not wait for it to finish (spec.md §4.E "run S").
    fn spawn(&mut self, command: &str);

    /// Runs `command` through `/bin/sh -c`, waits for it to finish, and
    /// returns its first line of stdout (spec.md §4.E "show run S";
    /// `original_source`'s `run_shell_and_get_output` truncates at the
    /// first newline). Returns an empty string on spawn failure.
    fn run_capturing(&mut self, command: &str) -> String;
}

impl dyn ShellRunner {
    /// Lets tests downcast `WindowManager::shell` back to
    /// `RecordingShellRunner` to inspect what was spawned/captured,
    /// since (unlike `Display`, passed per-call) the shell lives inside
    /// `WindowManager` itself.
    #[must_use]
    pub fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    #[must_use]
    pub fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// A recording fake used by `fensterchef-core`'s own tests (and
/// available to the bin crate's integration tests) so `run`/`show run`
/// can be exercised without actually spawning a shell -- mirrors
/// [`crate::display::RecordingDisplay`].
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct RecordingShellRunner {
    pub spawned: Vec<String>,
    pub captured: Vec<String>,
    pub capture_output: std::collections::HashMap<String, String>,
}

#[cfg(any(test, feature = "test-util"))]
impl RecordingShellRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl ShellRunner for RecordingShellRunner {
    fn spawn(&mut self, command: &str) {
        self.spawned.push(command.to_string());
    }

    fn run_capturing(&mut self, command: &str) -> String {
        self.captured.push(command.to_string());
        self.capture_output.get(command).cloned().unwrap_or_default()
    }
}
