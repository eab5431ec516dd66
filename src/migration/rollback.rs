//! Rollback through an external command, one invocation per migration unit.

use std::path::Path;
use std::process::Command;

use crate::error::HarnessResult;

/// Captured result of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs a shell command line.
pub trait ProcessInvoker: Send + Sync {
    fn invoke(&self, command_line: &str) -> HarnessResult<ProcessOutput>;
}

/// Runs command lines with `sh -c`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellInvoker;

impl ProcessInvoker for ShellInvoker {
    fn invoke(&self, command_line: &str) -> HarnessResult<ProcessOutput> {
        let output = Command::new("sh").arg("-c").arg(command_line).output()?;
        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackStep {
    pub identifier: String,
    pub command_line: String,
    pub output: ProcessOutput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// No rollback command configured; nothing was run
    NotConfigured,
    /// One step per migration unit, in invocation order
    Completed(Vec<RollbackStep>),
}

impl RollbackOutcome {
    pub fn performed(&self) -> bool {
        matches!(self, RollbackOutcome::Completed(_))
    }

    pub fn steps(&self) -> &[RollbackStep] {
        match self {
            RollbackOutcome::NotConfigured => &[],
            RollbackOutcome::Completed(steps) => steps,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.steps().iter().all(|step| step.output.success())
    }
}

/// `{command}{bin_dir}/{identifier}`, concatenated without separators.
pub fn rollback_command_line(command: &str, bin_dir: &Path, identifier: &str) -> String {
    format!("{}{}/{}", command, bin_dir.display(), identifier)
}
