//! ffscribe - ffprobe diagnostics parsing and profile-based transcoding
//!
//! This library crate exposes the CLI's building blocks for integration testing.

pub mod config;
pub mod job;

pub use ffscribe_av as av;
pub use ffscribe_probe as probe;
