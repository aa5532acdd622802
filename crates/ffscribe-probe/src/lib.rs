//! # ffscribe-probe
//!
//! Turns the human-oriented diagnostic text printed by `ffprobe -i <file>`
//! into a structured [`MediaMetadata`] tree.
//!
//! The text has no stable schema: labelled scalar fields, repeating groups
//! (`Input #N`, `Stream #N:M`) and loosely delimited `Metadata:` blocks.
//! This crate provides:
//!
//! - **Extraction** ([`Extractor`]) -- pull a labelled segment out of a
//!   buffer and get back the buffer with that segment consumed.
//! - **Parsing** ([`parse`]) -- drive repeated extractions to build
//!   build info, inputs, streams, tags and derived resolutions.
//! - **Path helpers** ([`paths`]) -- file name and extension of reported paths.
//!
//! No process is spawned here; see `ffscribe-av` for running the tools.
//!
//! ## Features
//!
//! - `serde` - Serialize/Deserialize for all metadata types
//!
//! ## Example
//!
//! ```
//! use ffscribe_probe::{parse, StreamKind};
//!
//! let text = "Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'naruto.mp4':\r\n\
//!             Stream #0:0(und): Video: h264 (High), yuv420p, 1280x720 [SAR 1:1 DAR 16:9], 976 kb/s\r\n";
//!
//! let meta = parse(text);
//! let input = &meta.inputs[0];
//! assert_eq!(input.container_format, "mp4");
//!
//! let video = input.stream("0:0").unwrap();
//! assert_eq!(video.kind, StreamKind::Video);
//! assert_eq!(video.resolution.map(|r| r.width), Some(1280));
//! ```

mod error;
mod extract;
mod parser;
pub mod paths;
mod types;

pub use error::{ParseError, Result};
pub use extract::{contains, extract, Extracted, Extraction, Extractor, CRLF};
pub use parser::parse;
pub use types::{Chapter, InputMetadata, MediaMetadata, Resolution, StreamKind, StreamMetadata};
