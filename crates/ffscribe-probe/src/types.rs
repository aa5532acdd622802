//! Metadata tree produced by the diagnostic text parser.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::extract::Extracted;

/// Frame size derived from a `WIDTHxHEIGHT [SAR .. DAR ..]` descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Create a new resolution.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse the size from a stream descriptor entry such as
    /// `1920x1080 [SAR 1:1 DAR 16:9]`.
    ///
    /// Only the last whitespace-separated token before the first `[` is
    /// considered. Returns `None` if that token is not `WxH`.
    pub fn from_descriptor(entry: &str) -> Option<Self> {
        let head = entry.split('[').next()?;
        head.split_whitespace().last()?.parse().ok()
    }
}

impl FromStr for Resolution {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s.split_once('x').unwrap_or((s, ""));
        Ok(Self {
            width: w.trim().parse()?,
            height: h.trim().parse()?,
        })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Stream type as announced by the label after the stream marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    Data,
    /// A stream with a label we do not classify (attachments, etc).
    Other,
}

impl StreamKind {
    const LABELED: [StreamKind; 4] = [
        StreamKind::Video,
        StreamKind::Audio,
        StreamKind::Subtitle,
        StreamKind::Data,
    ];

    /// The literal label printed by the probe tool, e.g. `Video:`.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            StreamKind::Video => Some("Video:"),
            StreamKind::Audio => Some("Audio:"),
            StreamKind::Subtitle => Some("Subtitle:"),
            StreamKind::Data => Some("Data:"),
            StreamKind::Other => None,
        }
    }

    /// Classify a descriptor by the first kind label it contains.
    pub fn classify(descriptor: &str) -> Self {
        Self::LABELED
            .into_iter()
            .find(|kind| kind.label().is_some_and(|l| descriptor.contains(l)))
            .unwrap_or(StreamKind::Other)
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StreamKind::Video => "video",
            StreamKind::Audio => "audio",
            StreamKind::Subtitle => "subtitle",
            StreamKind::Data => "data",
            StreamKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// One `Stream #N:M` block.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamMetadata {
    /// Stream number within its input (`M` of `N:M`).
    pub index: usize,
    pub kind: StreamKind,
    /// Language qualifier, e.g. `eng` from `Stream #0:1(eng)`.
    pub language: Option<String>,
    /// Trimmed codec/bitrate entries following the kind label.
    pub descriptor_lines: Vec<String>,
    pub resolution: Option<Resolution>,
    pub tags: BTreeMap<String, String>,
}

impl StreamMetadata {
    /// Build a stream from the extracted text after its marker.
    pub fn from_descriptor(index: usize, descriptor: &Extracted) -> Self {
        let entries = descriptor.entries();
        let first = entries.first().copied().unwrap_or_default();
        let kind = StreamKind::classify(first);

        let mut descriptor_lines = Vec::with_capacity(entries.len());
        let mut resolution = None;

        for entry in entries {
            let line = match kind.label().and_then(|l| entry.find(l).map(|p| p + l.len())) {
                Some(offset) => entry[offset..].trim(),
                None => entry.trim(),
            };

            if resolution.is_none() && (line.contains("SAR") || line.contains("DAR")) {
                resolution = Resolution::from_descriptor(line);
            }

            descriptor_lines.push(line.to_string());
        }

        Self {
            index,
            kind,
            language: parse_language(first),
            descriptor_lines,
            resolution,
            tags: BTreeMap::new(),
        }
    }

    /// Codec name, the first word of the first descriptor line.
    pub fn codec(&self) -> Option<&str> {
        self.descriptor_lines.first()?.split_whitespace().next()
    }
}

/// `(eng): Video: ...` -> `eng`; `[0x1](jpn): Audio: ...` -> `jpn`.
fn parse_language(first: &str) -> Option<String> {
    let (prefix, _) = first.split_once(": ")?;
    let open = prefix.find('(')?;
    let close = prefix[open..].find(')')? + open;
    let lang = prefix[open + 1..close].trim();
    (!lang.is_empty()).then(|| lang.to_string())
}

/// One `Input #N` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputMetadata {
    pub index: usize,
    pub file_path: String,
    pub file_name: String,
    /// Extension of `file_name`; empty when it has none.
    pub container_format: String,
    /// Demuxer names listed in the input header (`mov`, `mp4`, ...).
    pub formats: Vec<String>,
    pub tags: BTreeMap<String, String>,
    /// Resolution of the first stream that reported one.
    pub resolution: Option<Resolution>,
    /// Streams keyed by `"N:M"`, in declaration order.
    pub streams: Vec<(String, StreamMetadata)>,
    /// Entries of the `Chapters:` section, in declaration order.
    pub chapters: Vec<Chapter>,
}

impl InputMetadata {
    /// Create an empty input with the given index.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    /// Look up a stream by its `"N:M"` key.
    pub fn stream(&self, key: &str) -> Option<&StreamMetadata> {
        self.streams
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, stream)| stream)
    }

    /// Iterate streams in declaration order.
    pub fn streams(&self) -> impl Iterator<Item = &StreamMetadata> {
        self.streams.iter().map(|(_, stream)| stream)
    }

    pub fn video_streams(&self) -> impl Iterator<Item = &StreamMetadata> {
        self.streams().filter(|s| s.kind == StreamKind::Video)
    }

    pub fn audio_streams(&self) -> impl Iterator<Item = &StreamMetadata> {
        self.streams().filter(|s| s.kind == StreamKind::Audio)
    }

    /// The `Duration` tag, e.g. `00:23:40.06`.
    pub fn duration(&self) -> Option<&str> {
        self.tags.get("Duration").map(String::as_str)
    }

    pub fn start(&self) -> Option<&str> {
        self.tags.get("start").map(String::as_str)
    }

    pub fn bitrate(&self) -> Option<&str> {
        self.tags.get("bitrate").map(String::as_str)
    }
}

/// One `Chapter #N:M` entry of an input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chapter {
    /// Chapter number within its input.
    pub index: usize,
    /// Start time in seconds, as printed.
    pub start: Option<String>,
    /// End time in seconds, as printed.
    pub end: Option<String>,
    pub tags: BTreeMap<String, String>,
}

impl Chapter {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.tags.get("title").map(String::as_str)
    }
}

/// Root of the parsed diagnostic text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaMetadata {
    /// Version from the `ffprobe version X` banner, when printed.
    pub tool_version: Option<String>,
    /// Build information keyed by component (`configuration`, `libavutil`, ...).
    pub build_info: BTreeMap<String, Extracted>,
    /// Inputs in declaration order.
    pub inputs: Vec<InputMetadata>,
}

impl MediaMetadata {
    /// Get an input by position.
    pub fn input(&self, index: usize) -> Option<&InputMetadata> {
        self.inputs.get(index)
    }

    /// Resolution of the first input that has one.
    pub fn primary_resolution(&self) -> Option<Resolution> {
        self.inputs.iter().find_map(|i| i.resolution)
    }

    /// Whether no input was found.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}
