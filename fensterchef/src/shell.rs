//! The `/bin/sh -c` implementation of `fensterchef_core::shell::ShellRunner`
//! (SPEC_FULL.md §3.F).
//!
//! Grounded in `pgwm/src/manager/spawn.rs`'s detached-child pattern
//! (`Stdio::null()` on every standard stream, log the spawn, don't wait)
//! and in `original_source/src/utility/run_shell.c`'s two entry points:
//! `run_shell` fires a command through the shell and forgets it,
//! `run_shell_and_get_output` waits for it and keeps only the first line
//! of stdout.

use std::process::{Command, Stdio};

use fensterchef_core::shell::ShellRunner;

pub struct SystemShell;

impl ShellRunner for SystemShell {
    fn spawn(&mut self, command: &str) {
        let result = Command::new("/bin/sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match result {
            Ok(_) => log::debug!("spawned: {command}"),
            Err(err) => log::warn!("failed to spawn `{command}`: {err}"),
        }
    }

    fn run_capturing(&mut self, command: &str) -> String {
        let result = Command::new("/bin/sh").arg("-c").arg(command).stdin(Stdio::null()).output();
        match result {
            Ok(output) => String::from_utf8_lossy(&output.stdout).lines().next().unwrap_or("").to_string(),
            Err(err) => {
                log::warn!("failed to run `{command}`: {err}");
                String::new()
            }
        }
    }
}
