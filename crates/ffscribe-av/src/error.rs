//! Error types for ffscribe-av.

use std::time::Duration;

pub use ffscribe_probe::ParseError;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Misuse of the encode profile registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The profile name is empty or reserved.
    #[error("invalid profile name: {0}")]
    InvalidName(String),

    /// The flag set is not a flat, non-empty flag -> argument mapping.
    #[error("invalid profile flags: {0}")]
    InvalidFlags(String),

    /// No registered profile has the given flags (or name).
    #[error("unknown format {name:?}; register it or use one of the existing profiles")]
    UnknownProfile { name: String },

    /// The name or the exact flag set is already registered.
    #[error("profile already registered as {existing:?}")]
    Duplicate { existing: String },
}

impl FormatError {
    /// Create an invalid name error.
    pub fn invalid_name(message: impl Into<String>) -> Self {
        Self::InvalidName(message.into())
    }

    /// Create an invalid flags error.
    pub fn invalid_flags(message: impl Into<String>) -> Self {
        Self::InvalidFlags(message.into())
    }

    /// Create an unknown profile error.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownProfile { name: name.into() }
    }
}

/// Failure of an external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    /// The tool could not be located.
    #[error("tool not found: {tool}; is it installed and in PATH?")]
    NotFound { tool: String },

    /// The process could not be started or waited on.
    #[error("failed to run {tool}: {message}")]
    SpawnFailure { tool: String, message: String },

    /// The process ran and exited unsuccessfully.
    #[error("{tool} exited with {status}: {}", .stderr.trim())]
    NonZeroExit {
        tool: String,
        /// Exit status as reported by the OS (e.g. `exit status: 1`).
        status: String,
        stdout: String,
        stderr: String,
    },

    /// The caller cancelled the operation; the process was killed.
    #[error("{tool} was cancelled")]
    Cancelled { tool: String },

    /// The configured timeout elapsed; the process was killed.
    #[error("{tool} timed out after {timeout:?}")]
    TimedOut { tool: String, timeout: Duration },
}

impl ToolError {
    /// Create a tool not found error.
    pub fn not_found(tool: impl Into<String>) -> Self {
        Self::NotFound { tool: tool.into() }
    }

    /// Create a spawn failure error.
    pub fn spawn_failure(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SpawnFailure {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Name of the tool that failed.
    pub fn tool(&self) -> &str {
        match self {
            ToolError::NotFound { tool }
            | ToolError::SpawnFailure { tool, .. }
            | ToolError::NonZeroExit { tool, .. }
            | ToolError::Cancelled { tool }
            | ToolError::TimedOut { tool, .. } => tool,
        }
    }

    /// The captured error stream, or the spawn error message.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ToolError::NonZeroExit { stderr, .. } => Some(stderr),
            ToolError::SpawnFailure { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Whether the failure came from cancellation rather than the tool.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ToolError::Cancelled { .. })
    }
}

/// Errors that can occur while probing or transcoding.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
