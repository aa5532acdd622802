//! Probing and transcoding through the external tools.

use std::path::Path;

use ffscribe_probe::MediaMetadata;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{tool_name, TranscodeJob};
use crate::error::{Result, ToolError};
use crate::runner::{CommandRunner, ShellRunner, ToolOutput};
use crate::tools::ToolPaths;

/// Runs probe and transcode command lines.
///
/// Every operation spawns exactly one process and waits for it. Cancelling
/// the transcoder's token kills the running process.
#[derive(Debug, Clone)]
pub struct Transcoder<R = ShellRunner> {
    tools: ToolPaths,
    runner: R,
    cancel: CancellationToken,
}

impl Transcoder<ShellRunner> {
    /// A transcoder running commands through the platform shell.
    pub fn new(tools: ToolPaths) -> Self {
        Self::with_runner(tools, ShellRunner::new())
    }
}

impl<R: CommandRunner> Transcoder<R> {
    /// A transcoder using a custom runner.
    pub fn with_runner(tools: ToolPaths, runner: R) -> Self {
        Self {
            tools,
            runner,
            cancel: CancellationToken::new(),
        }
    }

    /// Use `token` to cancel running processes.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The token that cancels this transcoder's processes.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The configured tool paths.
    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    /// `<ffprobe> -i "<input>"`.
    pub fn probe_command(&self, input: &Path) -> String {
        format!(
            "{} -i \"{}\"",
            tool_name(&self.tools.ffprobe),
            input.display()
        )
    }

    /// Probe `input` and parse the diagnostic output.
    ///
    /// The probe tool writes its report to stderr. A failed run is only an
    /// error when that report holds no input section.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] if the tool cannot be run, is cancelled, or
    /// fails without describing the input.
    pub async fn metadata(&self, input: impl AsRef<Path>) -> Result<MediaMetadata> {
        let line = self.probe_command(input.as_ref());
        debug!(command = %line, "Probing");

        let output = self.runner.exec(&line, false, &self.cancel).await?;
        if !output.success() && !output.stderr.contains("Input #0") {
            warn!(command = %line, status = ?output.status, "Probe failed");
            return Err(ToolError::NonZeroExit {
                tool: tool_label(&self.tools.ffprobe),
                status: describe_status(output.status),
                stdout: output.stdout,
                stderr: output.stderr,
            }
            .into());
        }

        let metadata = ffscribe_probe::parse(&output.stderr);
        debug!(
            inputs = metadata.inputs.len(),
            build_info = metadata.build_info.len(),
            "Parsed probe output"
        );
        Ok(metadata)
    }

    /// Render `job` for the transcode tool and run it, writing `output`.
    ///
    /// Verbose jobs echo the command and the captured streams at `info`.
    /// A failure is logged once at `warn`, with the tool's stderr.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NonZeroExit`] carrying the captured stderr when
    /// the tool fails, or the runner's error if it cannot be run.
    pub async fn run(
        &self,
        job: &TranscodeJob,
        output: impl AsRef<Path>,
    ) -> std::result::Result<ToolOutput, ToolError> {
        let line = job.render(&self.tools.ffmpeg, output.as_ref());
        if job.is_verbose() {
            info!(command = %line, "Transcoding");
        } else {
            debug!(command = %line, "Transcoding");
        }

        match self.runner.exec(&line, true, &self.cancel).await {
            Ok(out) => {
                if job.is_verbose() {
                    info!(stdout = %out.stdout, stderr = %out.stderr, "Transcode finished");
                } else {
                    debug!(stderr_bytes = out.stderr.len(), "Transcode finished");
                }
                Ok(out)
            }
            Err(e) => {
                // The error's display already carries the tool's stderr.
                warn!(error = %e, "Transcode failed");
                Err(e)
            }
        }
    }
}

fn tool_label(tool: &Path) -> String {
    tool.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| tool.display().to_string())
}

fn describe_status(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status: {code}"),
        None => "signal".to_string(),
    }
}
