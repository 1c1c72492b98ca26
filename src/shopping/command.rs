use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument};

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("{program} failed: {stderr}")]
    Failed { program: String, stderr: String },
}

/// Runs an external program. Injected so handlers can be tested without
/// touching the host.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError>;
}

/// `tokio::process` runner with a hard timeout. The child is killed if the
/// timeout fires.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    #[instrument(skip(self, args), fields(args = args.len()))]
    async fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
        let child = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| CommandError::Timeout {
                program: program.to_string(),
                timeout: self.timeout,
            })?
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let output = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };
        debug!(exit_code = ?output.exit_code, "command finished");
        Ok(output)
    }
}
