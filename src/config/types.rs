use ffscribe_av::{ToolError, ToolPaths};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Echo transcode commands and tool output at info level
    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub tools: ToolsConfig,

    /// Custom encode profiles: profile name -> table of flag = value
    #[serde(default)]
    pub profiles: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Path to ffmpeg (resolved by the shell when unset)
    #[serde(default)]
    pub ffmpeg: Option<PathBuf>,

    /// Path to ffprobe (resolved by the shell when unset)
    #[serde(default)]
    pub ffprobe: Option<PathBuf>,

    /// Kill a tool after this many seconds; 0 disables the timeout
    #[serde(default)]
    pub timeout_secs: u64,
}

impl ToolsConfig {
    /// Configured tool paths, falling back to the bare tool names.
    pub fn paths(&self) -> ToolPaths {
        let defaults = ToolPaths::default();
        ToolPaths {
            ffmpeg: self.ffmpeg.clone().unwrap_or(defaults.ffmpeg),
            ffprobe: self.ffprobe.clone().unwrap_or(defaults.ffprobe),
        }
    }

    /// Tool paths for probing, with ffprobe located up front.
    pub fn for_probe(&self) -> Result<ToolPaths, ToolError> {
        self.paths().locate_ffprobe(self.ffprobe.as_deref())
    }

    /// Tool paths for transcoding, with ffmpeg located up front.
    pub fn for_transcode(&self) -> Result<ToolPaths, ToolError> {
        self.paths().locate_ffmpeg(self.ffmpeg.as_deref())
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}
