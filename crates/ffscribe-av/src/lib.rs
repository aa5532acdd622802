//! Encode profiles, transcode command building and external tool execution.
//!
//! - [`FormatRegistry`] holds the built-in `720p`/`540p`/`360p` profiles and
//!   any custom profiles registered at runtime.
//! - [`TranscodeJob`] collects encoder flags for one input and renders the
//!   `ffmpeg` command line.
//! - [`Transcoder`] runs probe and transcode commands, parsing probe output
//!   with [`ffscribe_probe`].
//!
//! # Example
//!
//! ```no_run
//! use ffscribe_av::{FormatRegistry, ToolPaths, TranscodeJob, Transcoder};
//!
//! # async fn example() -> ffscribe_av::Result<()> {
//! let registry = FormatRegistry::new();
//! let transcoder = Transcoder::new(ToolPaths::default());
//!
//! let metadata = transcoder.metadata("movie.mkv").await?;
//! println!("{:?}", metadata.primary_resolution());
//!
//! let mut job = TranscodeJob::new("movie.mkv").verbose(true);
//! job.apply_named(&registry, "540p")?;
//! transcoder.run(&job, "movie-540p.mp4").await?;
//! # Ok(())
//! # }
//! ```

mod command;
mod error;
mod formats;
mod runner;
mod tools;
mod transcoder;

pub use command::TranscodeJob;
pub use error::{Error, FormatError, ParseError, Result, ToolError};
pub use formats::{EncodeProfile, FormatRegistry};
pub use runner::{CommandRunner, ShellRunner, ToolCommand, ToolOutput};
pub use tools::{check_tool, check_tools, get_tool_path, require_tool, ToolInfo, ToolPaths};
pub use transcoder::Transcoder;

pub use ffscribe_probe::{InputMetadata, MediaMetadata, Resolution, StreamKind, StreamMetadata};
