//! External tool detection and management.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use crate::error::ToolError;

/// Information about an external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// First line of the tool's version output.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check if a tool is available and get its information.
///
/// The ffmpeg family prints its version with `-version`.
///
/// # Example
///
/// ```no_run
/// use ffscribe_av::check_tool;
///
/// let info = check_tool("ffprobe");
/// if info.available {
///     println!("ffprobe version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: impl AsRef<Path>) -> ToolInfo {
    let program = name.as_ref();
    let display = program.display().to_string();

    match Command::new(program).arg("-version").output() {
        Ok(output) if output.status.success() => ToolInfo {
            name: display,
            available: true,
            version: String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(str::to_string),
            path: which::which(program).ok(),
        },
        _ => ToolInfo {
            name: display,
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Check the configured ffmpeg and ffprobe.
pub fn check_tools(paths: &ToolPaths) -> Vec<ToolInfo> {
    vec![check_tool(&paths.ffmpeg), check_tool(&paths.ffprobe)]
}

/// Require that a tool is available, returning its path.
///
/// # Errors
///
/// Returns [`ToolError::NotFound`] if the tool is not on `PATH`.
pub fn require_tool(name: &str) -> Result<PathBuf, ToolError> {
    which::which(name).map_err(|_| ToolError::not_found(name))
}

/// Get the path to a tool, preferring a configured path over PATH lookup.
pub fn get_tool_path(name: &str, config_path: Option<&Path>) -> Result<PathBuf, ToolError> {
    if let Some(path) = config_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(
            tool = name,
            path = %path.display(),
            "Configured tool path does not exist, searching PATH"
        );
    }

    require_tool(name)
}

/// Locations of the transcode and probe tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for ToolPaths {
    /// Bare names, resolved by the shell at run time.
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl ToolPaths {
    /// Locate ffmpeg, preferring `configured` over a `PATH` search.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotFound`] if ffmpeg cannot be located.
    pub fn locate_ffmpeg(mut self, configured: Option<&Path>) -> Result<Self, ToolError> {
        self.ffmpeg = get_tool_path("ffmpeg", configured)?;
        Ok(self)
    }

    /// Locate ffprobe, preferring `configured` over a `PATH` search.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotFound`] if ffprobe cannot be located.
    pub fn locate_ffprobe(mut self, configured: Option<&Path>) -> Result<Self, ToolError> {
        self.ffprobe = get_tool_path("ffprobe", configured)?;
        Ok(self)
    }
}
