//! Command execution abstraction for environment probes.
//!
//! Platform detection shells out to PowerShell and `reg.exe`. Routing those
//! calls through [`CommandExecutor`] keeps probing testable on any host.

use crate::error::{InstallerError, Result};
use std::process::{Command, Output};

/// Abstraction for running external commands.
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
    /// use hpdrivers::command::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("reg", &["query", r"HKLM\SOFTWARE"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), hpdrivers::error::InstallerError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        Command::new(cmd)
            .args(args)
            .output()
            .map_err(InstallerError::from)
    }
}

/// Runs a command and returns its trimmed stdout when it exits successfully.
///
/// Returns `None` when the command cannot be spawned, exits non-zero, or
/// prints nothing.
pub fn stdout_of(executor: &dyn CommandExecutor, cmd: &str, args: &[&str]) -> Option<String> {
    let output = executor.run(cmd, args).ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, stdout_output};

    #[test]
    fn stdout_of_trims_successful_output() {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: "reg",
            args: vec!["query"],
            result: Ok(stdout_output("  value\r\n")),
        }]);
        assert_eq!(
            stdout_of(&executor, "reg", &["query"]).as_deref(),
            Some("value")
        );
        executor.assert_finished();
    }

    #[test]
    fn stdout_of_ignores_failed_commands() {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: "reg",
            args: vec!["query"],
            result: Ok(failure_output("access denied")),
        }]);
        assert!(stdout_of(&executor, "reg", &["query"]).is_none());
    }

    #[test]
    fn stdout_of_ignores_spawn_errors() {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: "powershell",
            args: vec![],
            result: Err(InstallerError::Io(std::io::Error::other("not found"))),
        }]);
        assert!(stdout_of(&executor, "powershell", &[]).is_none());
    }
}
