//! Shared helpers for spawning external tools.

use crate::error::{ProcessError, ProcessResult};
use std::ffi::OsStr;
use std::process::{Command, Output};
use tracing::debug;

pub(crate) fn is_available(tool: &str) -> bool {
    which::which(tool).is_ok()
}

/// Fail early with `ToolNotFound` when `tool` is not on `PATH`.
pub(crate) fn require(tool: &str) -> ProcessResult<()> {
    if is_available(tool) {
        Ok(())
    } else {
        Err(ProcessError::ToolNotFound {
            tool: tool.to_string(),
        })
    }
}

/// Run `tool` to completion, returning its output on a zero exit status.
pub(crate) fn run<I, S>(tool: &str, args: I) -> ProcessResult<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    require(tool)?;

    let mut command = Command::new(tool);
    command.args(args);
    debug!("Running {:?}", command);

    let output = command.output()?;
    if !output.status.success() {
        return Err(ProcessError::ProcessFailed {
            tool: tool.to_string(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}
