//! Invocation of the external transfer tools
//!
//! Tools are started directly (no shell), their output is captured in full and the call
//! returns once the process has exited.

use common::error::{Error, Result};

/// Captured result of one tool invocation
#[derive(Debug)]
pub struct ToolOutput {
    pub command: String,
    pub status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Exit status zero and no diagnostic output.
    pub fn succeeded(&self) -> bool {
        self.status.success() && self.stderr.trim().is_empty()
    }

    pub fn into_error(self) -> Error {
        Error::Tool {
            command: self.command,
            status: self.status.to_string(),
            stderr: self.stderr.trim().to_string(),
        }
    }
}

pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs `program` with `args` and waits for it to finish.
///
/// Failing to start the program at all is an [`Error::Io`]; everything else is reported
/// through the returned [`ToolOutput`].
pub async fn run(program: &str, args: &[String]) -> Result<ToolOutput> {
    let command = command_line(program, args);
    tracing::info!("> {}", command);
    let output = tokio::process::Command::new(program)
        .args(args)
        .stdin(std::process::Stdio::null())
        .output()
        .await
        .map_err(|error| {
            std::io::Error::new(error.kind(), format!("failed to run {program}: {error}"))
        })?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    tracing::debug!("{} exited with {}", program, output.status);
    if !stdout.is_empty() {
        tracing::debug!("stdout:\n{}", stdout.trim_end());
    }
    if !stderr.is_empty() {
        tracing::debug!("stderr:\n{}", stderr.trim_end());
    }
    Ok(ToolOutput {
        command,
        status: output.status,
        stdout,
        stderr,
    })
}
