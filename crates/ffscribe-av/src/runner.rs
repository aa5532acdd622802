//! External process execution with cancellation and timeout support.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ToolError;

/// Output captured from a tool execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` if the process was terminated by a signal.
    pub status: Option<i32>,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl ToolOutput {
    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// A builder for a single shell command line.
///
/// The child runs in its own process group. The whole group is killed if
/// the cancellation token fires or the timeout elapses, so tools started
/// by the shell do not outlive the command.
///
/// # Example
///
/// ```no_run
/// use ffscribe_av::ToolCommand;
///
/// # async fn example() -> Result<(), ffscribe_av::ToolError> {
/// let output = ToolCommand::shell("ffprobe -i \"in.mp4\"")
///     .allow_failure(true)
///     .execute()
///     .await?;
/// println!("{}", output.stderr);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    line: String,
    timeout: Option<Duration>,
    cancel: CancellationToken,
    allow_failure: bool,
}

/// How the wait for the child ended.
enum Outcome {
    Exited(std::io::Result<(ExitStatus, Vec<u8>, Vec<u8>)>),
    Cancelled,
    TimedOut,
}

impl ToolCommand {
    /// Hand `line` to the platform shell (`sh -c` or `cmd /C`) unchanged.
    pub fn shell(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            timeout: None,
            cancel: CancellationToken::new(),
            allow_failure: false,
        }
    }

    /// Set the maximum execution time. `None` waits indefinitely.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Kill the process when `token` is cancelled.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Return the captured output instead of an error on a non-zero exit.
    pub fn allow_failure(mut self, allow: bool) -> Self {
        self.allow_failure = allow;
        self
    }

    /// Name used in errors and logs: the file name of the first word of
    /// the line, which may be double-quoted.
    pub fn tool_name(&self) -> String {
        let line = self.line.trim_start();
        let word = match line.strip_prefix('"') {
            Some(quoted) => quoted.split('"').next(),
            None => line.split(char::is_whitespace).next(),
        }
        .unwrap_or_default();
        word.rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or(word)
            .to_string()
    }

    #[cfg(windows)]
    fn command(&self) -> Command {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").raw_arg(&self.line);
        cmd
    }

    #[cfg(not(windows))]
    fn command(&self) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&self.line);
        // New group led by the shell, so the tools it starts can be
        // signalled together.
        cmd.process_group(0);
        cmd
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - [`ToolError::SpawnFailure`] if the shell cannot be started or
    ///   waited on.
    /// - [`ToolError::NonZeroExit`] if the process exits unsuccessfully
    ///   (unless [`allow_failure`](Self::allow_failure) is set).
    /// - [`ToolError::Cancelled`] / [`ToolError::TimedOut`] after killing
    ///   the process tree.
    pub async fn execute(&self) -> Result<ToolOutput, ToolError> {
        let tool = self.tool_name();

        let mut cmd = self.command();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| ToolError::spawn_failure(&tool, format!("failed to spawn: {e}")))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let deadline = async {
            match self.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };

        let outcome = tokio::select! {
            result = async {
                let (status, stdout, stderr) =
                    tokio::join!(child.wait(), read_stream(stdout), read_stream(stderr));
                Ok::<_, std::io::Error>((status?, stdout?, stderr?))
            } => Outcome::Exited(result),
            _ = self.cancel.cancelled() => Outcome::Cancelled,
            _ = deadline => Outcome::TimedOut,
        };

        let (status, stdout, stderr) = match outcome {
            Outcome::Exited(result) => result.map_err(|e| {
                ToolError::spawn_failure(&tool, format!("I/O error waiting for process: {e}"))
            })?,
            Outcome::Cancelled => {
                kill_tree(&mut child).await;
                return Err(ToolError::Cancelled { tool });
            }
            Outcome::TimedOut => {
                kill_tree(&mut child).await;
                return Err(ToolError::TimedOut {
                    tool,
                    timeout: self.timeout.unwrap_or_default(),
                });
            }
        };

        let tool_output = ToolOutput {
            status: status.code(),
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
        };

        if !status.success() && !self.allow_failure {
            return Err(ToolError::NonZeroExit {
                tool,
                status: status.to_string(),
                stdout: tool_output.stdout,
                stderr: tool_output.stderr,
            });
        }

        Ok(tool_output)
    }
}

async fn read_stream<R: AsyncRead + Unpin>(stream: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        stream.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Kill the child and everything it started, then reap it.
async fn kill_tree(child: &mut Child) {
    if let Some(pid) = child.id() {
        kill_group(pid).await;
    }
    if let Err(e) = child.kill().await {
        debug!(error = %e, "Child already exited");
    }
}

#[cfg(unix)]
async fn kill_group(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(pgid) = i32::try_from(pid) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        debug!(pid, error = %e, "Process group already gone");
    }
}

#[cfg(windows)]
async fn kill_group(pid: u32) {
    let result = Command::new("taskkill")
        .args(["/F", "/T", "/PID", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(e) = result {
        debug!(pid, error = %e, "taskkill failed");
    }
}

/// Executes a rendered command line.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command_line`, killing it if `cancel` fires.
    ///
    /// Implementations return [`ToolError::NonZeroExit`] on failure only
    /// when `check` is set; otherwise the output is returned as is.
    async fn exec(
        &self,
        command_line: &str,
        check: bool,
        cancel: &CancellationToken,
    ) -> Result<ToolOutput, ToolError>;
}

/// Runs command lines through the platform shell.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    timeout: Option<Duration>,
}

impl ShellRunner {
    /// A runner with no timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill commands that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn exec(
        &self,
        command_line: &str,
        check: bool,
        cancel: &CancellationToken,
    ) -> Result<ToolOutput, ToolError> {
        ToolCommand::shell(command_line)
            .timeout(self.timeout)
            .cancel_on(cancel.clone())
            .allow_failure(!check)
            .execute()
            .await
    }
}
