//! Run commands and serve their output inline or page by page.

use std::path::PathBuf;
use std::sync::Arc;

use cmdpager_bash_runner::{CommandExecutor, CommandInvocation, ProcessCommandExecutor};
use cmdpager_config::{CmdpagerConfig, ExecConfig};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PagerError;
use crate::format::format_command_output;
use crate::pagination::PageLimits;
use crate::store::{OutputId, OutputStore};
use crate::tokens::{CharacterRatioTokenEstimator, SharedTokenEstimator};

/// Input of a command run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RunRequest {
    /// Shell command to execute.
    pub command: String,
    /// Directory to run the command in. Defaults to the server's working
    /// directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,
    /// Seconds to wait before the command is killed. Defaults to 30.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl RunRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            working_directory: None,
            timeout_seconds: None,
        }
    }
}

/// Outcome of a command run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunResponse {
    /// Output small enough to return directly.
    Complete {
        output: String,
        estimated_tokens: usize,
        command: String,
        return_code: i32,
    },
    /// Output stored for page-by-page retrieval.
    Paginated {
        output_id: OutputId,
        total_pages: usize,
        total_lines: usize,
        estimated_tokens: usize,
        command: String,
        return_code: i32,
    },
}

impl RunResponse {
    pub fn return_code(&self) -> i32 {
        match self {
            Self::Complete { return_code, .. } | Self::Paginated { return_code, .. } => {
                *return_code
            }
        }
    }
}

/// Input of a page read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReadPageRequest {
    /// Identifier returned by a paginated run.
    pub output_id: String,
    /// Page number, starting at 1.
    pub page: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadPageResponse {
    pub output_id: String,
    pub command: String,
    pub page: usize,
    pub total_pages: usize,
    pub pages_read: Vec<usize>,
    pub all_pages_read: bool,
    pub content: String,
    pub has_next: bool,
    pub has_previous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Settings the session reads from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub limits: PageLimits,
    pub token_threshold: usize,
    pub chars_per_token: usize,
    pub exec: ExecConfig,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&CmdpagerConfig::default())
    }
}

impl From<&CmdpagerConfig> for SessionSettings {
    fn from(config: &CmdpagerConfig) -> Self {
        Self {
            limits: PageLimits::from(&config.pagination),
            token_threshold: config.pagination.token_threshold,
            chars_per_token: config.pagination.chars_per_token,
            exec: config.exec.clone(),
        }
    }
}

/// Runs commands and serves paginated output. Constructed once and shared by
/// handle between request handlers.
pub struct OutputSession {
    store: Arc<OutputStore>,
    executor: Arc<dyn CommandExecutor>,
    estimator: SharedTokenEstimator,
    settings: SessionSettings,
}

impl OutputSession {
    pub fn new(settings: SessionSettings, executor: Arc<dyn CommandExecutor>) -> Self {
        let estimator: SharedTokenEstimator =
            Arc::new(CharacterRatioTokenEstimator::new(settings.chars_per_token));
        let store = Arc::new(OutputStore::new(settings.limits, Arc::clone(&estimator)));
        Self {
            store,
            executor,
            estimator,
            settings,
        }
    }

    /// Session backed by the system shell.
    pub fn with_process_executor(settings: SessionSettings) -> Self {
        Self::new(settings, Arc::new(ProcessCommandExecutor::new()))
    }

    pub fn store(&self) -> &Arc<OutputStore> {
        &self.store
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Estimated token count above which output is paginated.
    pub fn token_threshold(&self) -> usize {
        self.settings.token_threshold
    }

    pub async fn run(&self, request: RunRequest) -> Result<RunResponse, PagerError> {
        let RunRequest {
            command,
            working_directory,
            timeout_seconds,
        } = request;

        if command.trim().is_empty() {
            return Err(PagerError::InvalidArgument("command must not be empty".into()));
        }
        if timeout_seconds == Some(0) {
            return Err(PagerError::InvalidArgument("timeout_seconds must be at least 1".into()));
        }

        let timeout = self.settings.exec.resolve_timeout(timeout_seconds);
        let working_dir = working_directory.unwrap_or_else(|| PathBuf::from("."));
        let invocation = CommandInvocation::new(command.clone(), working_dir).with_timeout(timeout);

        let output = match self.executor.execute(&invocation).await {
            Ok(output) => output,
            Err(err) => {
                warn!(command = %command, error = %err, "command did not produce a result");
                return Err(err.into());
            }
        };

        let return_code = output.exit_code();
        let formatted = format_command_output(&output);
        let estimated_tokens = self.estimator.estimate_tokens(&formatted);

        if estimated_tokens <= self.settings.token_threshold {
            info!(
                command = %command,
                return_code,
                estimated_tokens,
                "command output returned inline"
            );
            return Ok(RunResponse::Complete {
                output: formatted,
                estimated_tokens,
                command,
                return_code,
            });
        }

        let output_id = OutputId::new();
        let stored = self
            .store
            .put(output_id.clone(), command.clone(), formatted, return_code)?;
        info!(
            command = %command,
            output_id = %output_id,
            return_code,
            estimated_tokens,
            total_pages = stored.total_pages,
            "command output paginated"
        );

        Ok(RunResponse::Paginated {
            output_id,
            total_pages: stored.total_pages,
            total_lines: stored.total_lines,
            estimated_tokens: stored.estimated_tokens,
            command,
            return_code,
        })
    }

    pub fn read_page(&self, request: ReadPageRequest) -> Result<ReadPageResponse, PagerError> {
        let output_id = request.output_id.trim();
        if output_id.is_empty() {
            return Err(PagerError::InvalidArgument("output_id must not be empty".into()));
        }

        let delivery = self.store.deliver_page(output_id, request.page)?;
        let page = delivery.page.current_page;
        let total_pages = delivery.page.total_pages;
        let note = delivery.evicted.then(|| {
            format!(
                "All {total_pages} pages have been read. Output {output_id} has been released and can no longer be retrieved."
            )
        });

        Ok(ReadPageResponse {
            output_id: output_id.to_string(),
            command: delivery.command,
            page,
            total_pages,
            pages_read: delivery.pages_read,
            all_pages_read: delivery.evicted,
            content: delivery.page.content,
            has_next: page < total_pages,
            has_previous: page > 1,
            note,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use cmdpager_bash_runner::{CommandOutput, CommandStatus, RunnerError};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    /// Executor returning canned results and recording invocations.
    struct CannedExecutor {
        result: Mutex<Option<Result<CommandOutput, RunnerError>>>,
        seen: Mutex<Vec<CommandInvocation>>,
    }

    impl CannedExecutor {
        fn new(result: Result<CommandOutput, RunnerError>) -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(Some(result)),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn stdout(stdout: impl Into<String>) -> Arc<Self> {
            Self::new(Ok(CommandOutput::success(stdout)))
        }
    }

    #[async_trait]
    impl CommandExecutor for CannedExecutor {
        async fn execute(
            &self,
            invocation: &CommandInvocation,
        ) -> Result<CommandOutput, RunnerError> {
            self.seen.lock().push(invocation.clone());
            self.result
                .lock()
                .take()
                .unwrap_or_else(|| Ok(CommandOutput::success("")))
        }
    }

    fn settings(token_threshold: usize, page_size_lines: usize) -> SessionSettings {
        SessionSettings {
            limits: PageLimits {
                page_size_lines,
                max_chars_per_page: 30_000,
            },
            token_threshold,
            ..SessionSettings::default()
        }
    }

    #[tokio::test]
    async fn small_output_is_returned_inline() {
        let session = OutputSession::new(SessionSettings::default(), CannedExecutor::stdout("hi"));
        let response = session.run(RunRequest::new("echo hi")).await.expect("run");
        assert_eq!(
            response,
            RunResponse::Complete {
                output: "STDOUT:\nhi\n\nSTDERR:\n\n\nReturn code: 0".into(),
                estimated_tokens: 9,
                command: "echo hi".into(),
                return_code: 0,
            }
        );
        assert!(session.store().is_empty());
    }

    #[tokio::test]
    async fn non_zero_exit_is_a_result() {
        let executor = CannedExecutor::new(Ok(CommandOutput {
            status: CommandStatus::new(false, Some(1)),
            stdout: String::new(),
            stderr: String::new(),
        }));
        let session = OutputSession::new(SessionSettings::default(), executor);
        let response = session.run(RunRequest::new("exit 1")).await.expect("run");
        assert_eq!(response.return_code(), 1);
    }

    #[tokio::test]
    async fn timeout_is_an_error() {
        let executor = CannedExecutor::new(Err(RunnerError::Timeout {
            command: "sleep 10".into(),
            timeout: Duration::from_secs(1),
        }));
        let session = OutputSession::new(SessionSettings::default(), executor);
        let err = session
            .run(RunRequest {
                timeout_seconds: Some(1),
                ..RunRequest::new("sleep 10")
            })
            .await
            .expect_err("timed out");
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn requested_timeout_is_clamped_and_forwarded() {
        let executor = CannedExecutor::stdout("");
        let session = OutputSession::new(SessionSettings::default(), executor.clone());
        session
            .run(RunRequest {
                working_directory: Some(PathBuf::from("/tmp")),
                timeout_seconds: Some(100_000),
                ..RunRequest::new("true")
            })
            .await
            .expect("run");

        let seen = executor.seen.lock();
        assert_eq!(seen[0].timeout, Duration::from_secs(600));
        assert_eq!(seen[0].working_dir, PathBuf::from("/tmp"));
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_execution() {
        let executor = CannedExecutor::stdout("");
        let session = OutputSession::new(SessionSettings::default(), executor.clone());

        let empty = session.run(RunRequest::new("   ")).await.expect_err("empty");
        assert_eq!(empty.kind(), ErrorKind::InvalidArgument);

        let zero = session
            .run(RunRequest {
                timeout_seconds: Some(0),
                ..RunRequest::new("true")
            })
            .await
            .expect_err("zero timeout");
        assert_eq!(zero.kind(), ErrorKind::InvalidArgument);

        assert!(executor.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn large_output_is_paginated_and_released_after_reading() {
        let stdout = (1..=30).map(|n| format!("line {n}")).collect::<Vec<_>>().join("\n");
        let session = OutputSession::new(settings(10, 10), CannedExecutor::stdout(stdout));

        let response = session.run(RunRequest::new("seq")).await.expect("run");
        let RunResponse::Paginated {
            output_id,
            total_pages,
            total_lines,
            ..
        } = response
        else {
            panic!("expected paginated response, got {response:?}");
        };
        // 30 stdout lines plus the section headers and return code line.
        assert_eq!(total_lines, 36);
        assert_eq!(total_pages, 4);

        let mut last = None;
        for page in 1..=total_pages as i64 {
            let response = session
                .read_page(ReadPageRequest {
                    output_id: output_id.to_string(),
                    page,
                })
                .expect("page");
            assert_eq!(response.has_previous, page > 1);
            assert_eq!(response.has_next, (page as usize) < total_pages);
            last = Some(response);
        }

        let last = last.expect("read at least one page");
        assert!(last.all_pages_read);
        assert_eq!(last.pages_read, vec![1, 2, 3, 4]);
        assert!(last.note.is_some());
        assert!(last.content.ends_with("Return code: 0"));

        let err = session
            .read_page(ReadPageRequest {
                output_id: output_id.to_string(),
                page: 1,
            })
            .expect_err("released");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn first_page_read_reports_progress_without_note() {
        let stdout = "x\n".repeat(40);
        let session = OutputSession::new(settings(1, 10), CannedExecutor::stdout(stdout));
        let RunResponse::Paginated { output_id, .. } =
            session.run(RunRequest::new("yes x")).await.expect("run")
        else {
            panic!("expected paginated response");
        };

        let first = session
            .read_page(ReadPageRequest {
                output_id: output_id.to_string(),
                page: 1,
            })
            .expect("page 1");
        assert_eq!(first.pages_read, vec![1]);
        assert!(!first.all_pages_read);
        assert!(first.note.is_none());
        assert!(first.content.starts_with("STDOUT:\nx"));
    }

    #[test]
    fn read_page_validates_input() {
        let session = OutputSession::new(SessionSettings::default(), CannedExecutor::stdout(""));
        let empty = session
            .read_page(ReadPageRequest {
                output_id: " ".into(),
                page: 1,
            })
            .expect_err("empty id");
        assert_eq!(empty.kind(), ErrorKind::InvalidArgument);

        let unknown = session
            .read_page(ReadPageRequest {
                output_id: "missing".into(),
                page: 1,
            })
            .expect_err("unknown id");
        assert_eq!(unknown.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn responses_serialize_with_status_tag() {
        let value = serde_json::to_value(RunResponse::Paginated {
            output_id: OutputId::from("id-1"),
            total_pages: 2,
            total_lines: 900,
            estimated_tokens: 12_000,
            command: "cat big.log".into(),
            return_code: 0,
        })
        .expect("serializes");
        assert_eq!(value["status"], "paginated");
        assert_eq!(value["output_id"], "id-1");
        assert_eq!(value["total_pages"], 2);
    }
}
