use cmdpager_bash_runner::RunnerError;
use serde::Serialize;
use thiserror::Error;

/// Stable classification of [`PagerError`], used by the protocol layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Timeout,
    ExecutionFailure,
    OutOfRange,
    AlreadyExists,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::Timeout => "timeout",
            Self::ExecutionFailure => "execution_failure",
            Self::OutOfRange => "out_of_range",
            Self::AlreadyExists => "already_exists",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the session and the output store. All of them are
/// local to one request.
#[derive(Debug, Error)]
pub enum PagerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("output '{id}' not found: the ID is invalid or the output has expired")]
    NotFound { id: String },

    #[error("command timed out after {seconds} seconds: {command}")]
    Timeout { command: String, seconds: u64 },

    #[error("failed to execute '{command}': {message}")]
    ExecutionFailure { command: String, message: String },

    #[error("page {page} is out of range; valid pages are 1 to {total_pages}")]
    OutOfRange { page: i64, total_pages: usize },

    #[error("output '{id}' is already stored")]
    AlreadyExists { id: String },
}

impl PagerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::ExecutionFailure { .. } => ErrorKind::ExecutionFailure,
            Self::OutOfRange { .. } => ErrorKind::OutOfRange,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
        }
    }

    pub(crate) fn not_found(id: &str) -> Self {
        Self::NotFound { id: id.to_string() }
    }
}

impl From<RunnerError> for PagerError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::EmptyCommand | RunnerError::InvalidWorkingDirectory { .. } => {
                Self::InvalidArgument(err.to_string())
            }
            RunnerError::Timeout { command, timeout } => Self::Timeout {
                command,
                seconds: timeout.as_secs(),
            },
            RunnerError::Spawn { ref command, .. } | RunnerError::Wait { ref command, .. } => {
                Self::ExecutionFailure {
                    command: command.clone(),
                    message: err.to_string(),
                }
            }
        }
    }
}
