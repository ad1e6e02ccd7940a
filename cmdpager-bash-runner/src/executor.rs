use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::RunnerError;
use crate::process_group::{self, KillSignal};

/// Default time a command may run before it is killed.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Shell family used to execute commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellKind {
    Unix,
    Windows,
}

impl ShellKind {
    /// Shell family of the platform this binary was built for.
    pub fn host() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }
}

impl Default for ShellKind {
    fn default() -> Self {
        Self::host()
    }
}

/// Describes a command that will be executed by a [`CommandExecutor`].
#[derive(Debug, Clone)]
pub struct CommandInvocation {
    pub shell: ShellKind,
    pub command: String,
    pub working_dir: PathBuf,
    pub timeout: Duration,
}

impl CommandInvocation {
    pub fn new(command: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            shell: ShellKind::host(),
            command: command.into(),
            working_dir: working_dir.into(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_shell(mut self, shell: ShellKind) -> Self {
        self.shell = shell;
        self
    }
}

/// Describes the exit status of a command execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    success: bool,
    code: Option<i32>,
}

impl CommandStatus {
    pub fn new(success: bool, code: Option<i32>) -> Self {
        Self { success, code }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }
}

impl From<std::process::ExitStatus> for CommandStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let code = {
            use std::os::unix::process::ExitStatusExt;
            status
                .code()
                .or_else(|| status.signal().map(process_group::signal_exit_code))
        };
        #[cfg(not(unix))]
        let code = status.code();

        Self {
            success: status.success(),
            code,
        }
    }
}

/// Output produced by the executor for a command invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: CommandStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::new(true, Some(0)),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Exit code reported to callers; `-1` when the platform gave none.
    pub fn exit_code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }
}

/// Trait implemented by concrete command execution strategies.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, invocation: &CommandInvocation) -> Result<CommandOutput, RunnerError>;
}

/// Executes commands by delegating to the system shell via [`tokio::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessCommandExecutor;

impl ProcessCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

fn build_command(invocation: &CommandInvocation) -> Command {
    let mut command = match invocation.shell {
        ShellKind::Unix => {
            let mut command = Command::new("sh");
            command.arg("-c").arg(&invocation.command);
            command
        }
        ShellKind::Windows => {
            let mut command = Command::new("powershell");
            command
                .arg("-NoProfile")
                .arg("-NonInteractive")
                .arg("-Command")
                .arg(&invocation.command);
            command
        }
    };

    command
        .current_dir(&invocation.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(unix)]
    command.process_group(0);

    command
}

/// Drain a child pipe to the end on a separate task.
fn spawn_reader<R>(reader: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut reader) = reader
            && let Err(err) = reader.read_to_end(&mut buf).await
        {
            debug!(error = %err, "stopped reading child output");
        }
        buf
    })
}

#[async_trait]
impl CommandExecutor for ProcessCommandExecutor {
    async fn execute(&self, invocation: &CommandInvocation) -> Result<CommandOutput, RunnerError> {
        if invocation.command.trim().is_empty() {
            return Err(RunnerError::EmptyCommand);
        }
        if !invocation.working_dir.is_dir() {
            return Err(RunnerError::InvalidWorkingDirectory {
                path: invocation.working_dir.clone(),
            });
        }

        let mut child = build_command(invocation)
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                command: invocation.command.clone(),
                source,
            })?;

        let stdout_task = spawn_reader(child.stdout.take());
        let stderr_task = spawn_reader(child.stderr.take());
        let reader_aborts = [stdout_task.abort_handle(), stderr_task.abort_handle()];

        let started = Instant::now();
        // Readers are awaited inside the deadline too: a backgrounded
        // grandchild can keep the pipes open after the shell exits.
        let outcome = tokio::time::timeout(invocation.timeout, async {
            let status = child.wait().await;
            let stdout = stdout_task.await.unwrap_or_default();
            let stderr = stderr_task.await.unwrap_or_default();
            (status, stdout, stderr)
        })
        .await;

        match outcome {
            Ok((Ok(status), stdout, stderr)) => {
                let status = CommandStatus::from(status);
                debug!(
                    command = %invocation.command,
                    code = ?status.code(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "command finished"
                );
                Ok(CommandOutput {
                    status,
                    stdout: String::from_utf8_lossy(&stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                })
            }
            Ok((Err(source), _, _)) => {
                for handle in &reader_aborts {
                    handle.abort();
                }
                Err(RunnerError::Wait {
                    command: invocation.command.clone(),
                    source,
                })
            }
            Err(_) => {
                warn!(
                    command = %invocation.command,
                    timeout_secs = invocation.timeout.as_secs(),
                    "command timed out; killing process group"
                );
                if let Err(err) =
                    process_group::kill_child_process_group(&mut child, KillSignal::Kill)
                {
                    warn!(error = %err, "failed to kill timed out process group");
                }
                if let Err(err) = child.wait().await {
                    debug!(error = %err, "failed to reap timed out child");
                }
                for handle in &reader_aborts {
                    handle.abort();
                }
                Err(RunnerError::Timeout {
                    command: invocation.command.clone(),
                    timeout: invocation.timeout,
                })
            }
        }
    }
}
