use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures that prevent a command from producing a result.
///
/// A command that runs and exits with a non-zero status is *not* an error;
/// it is reported through [`CommandStatus`](crate::CommandStatus).
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("cannot execute an empty command")]
    EmptyCommand,

    #[error("working directory '{}' does not exist or is not a directory", path.display())]
    InvalidWorkingDirectory { path: PathBuf },

    #[error("command timed out after {} seconds: {command}", timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    #[error("failed to start command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed while waiting for command '{command}': {source}")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl RunnerError {
    /// True when the command was started but did not finish in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
