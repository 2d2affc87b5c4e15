use crate::adapters::{ExitCode, Shell};
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::process::{Command, ExitStatus, Stdio};

/// Runs script shell commands through the platform shell
/// (`sh -c` on Unix, `cmd /C` elsewhere).
pub struct SystemShell {
    program: OsString,
    flag: &'static str,
}

impl SystemShell {
    pub fn new(program: impl Into<OsString>, flag: &'static str) -> Self {
        Self {
            program: program.into(),
            flag,
        }
    }

    fn command(&self, command: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(self.flag).arg(command);
        cmd
    }
}

impl Default for SystemShell {
    #[cfg(unix)]
    fn default() -> Self {
        Self::new("sh", "-c")
    }

    #[cfg(not(unix))]
    fn default() -> Self {
        Self::new("cmd", "/C")
    }
}

impl Shell for SystemShell {
    fn run_sync(&mut self, command: &str) -> Result<ExitCode> {
        let exit_status = self
            .command(command)
            .status()
            .with_context(|| format!("failed to run '{command}'"))?;
        match exit_status.code() {
            Some(x) => Ok(x),
            None => Ok(terminated_by_signal(exit_status)),
        }
    }

    /// Fire and forget: the `Child` handle is dropped without `wait`, so the
    /// exit status is never collected.
    fn run_detached(&mut self, command: &str) -> Result<()> {
        let child = self
            .command(command)
            .stdin(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to start '{command}'"))?;
        log::debug!("started pid {} for '{}'", child.id(), command);
        Ok(())
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn run_sync_reports_exit_code() {
        let mut shell = SystemShell::default();
        assert_eq!(shell.run_sync("true").unwrap(), 0);
        assert_eq!(shell.run_sync("exit 3").unwrap(), 3);
    }

    #[test]
    #[cfg(unix)]
    fn run_sync_killed_by_signal() {
        let mut shell = SystemShell::default();
        assert_eq!(shell.run_sync("kill -9 $$").unwrap(), 128 + 9);
    }

    #[test]
    #[cfg(unix)]
    fn run_sync_waits_for_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("done");
        let mut shell = SystemShell::default();
        shell
            .run_sync(&format!("sleep 0.1 && touch '{}'", marker.display()))
            .unwrap();
        assert!(marker.exists());
    }

    #[test]
    #[cfg(unix)]
    fn run_detached_returns_immediately() {
        let mut shell = SystemShell::default();
        let started = std::time::Instant::now();
        shell.run_detached("sleep 2").unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn missing_shell_program_is_an_error() {
        let mut shell = SystemShell::new("/nonexistent/shell/for/keyplay", "-c");
        assert!(shell.run_sync("true").is_err());
        assert!(shell.run_detached("true").is_err());
    }
}
