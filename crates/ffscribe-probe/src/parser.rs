//! Walks the probe tool's diagnostic text and builds a [`MediaMetadata`].
//!
//! The text is consumed front to back with repeated extractions:
//!
//! 1. build information (`configuration:`, `libavutil`, ...)
//! 2. `Input #N` headers, each followed by its `Metadata:`/`Duration:` block
//!    and an optional `Chapters:` section
//! 3. `Stream #N:M` lines, each optionally followed by a `Metadata:` block
//!
//! Every extraction is guarded by a presence check, so a missing marker ends
//! the current repeat group instead of failing the parse.

use std::collections::{BTreeMap, VecDeque};

use crate::extract::{contains, Extracted, Extractor, CRLF};
use crate::paths;
use crate::types::{Chapter, InputMetadata, MediaMetadata, StreamMetadata};

/// Build information labels, in the order the tool prints them.
const BUILD_INFO_LABELS: &[&str] = &[
    "configuration:",
    "libavutil",
    "libavcodec",
    "libavformat",
    "libavdevice",
    "libavfilter",
    "libswscale",
    "libswresample",
    "libpostproc",
];

const CONFIGURATION_LABEL: &str = "configuration:";
const METADATA_LABEL: &str = "Metadata:";
const DURATION_LABEL: &str = "Duration:";
const CHAPTERS_LABEL: &str = "Chapters:";
const CHAPTER_PREFIX: &str = "Chapter #";
const BANNER_TOOLS: &[&str] = &["ffprobe", "ffmpeg"];

/// Parse diagnostic text into a metadata tree.
///
/// # Example
///
/// ```
/// let text = "Input #0, matroska,webm, from 'show.mkv':\r\n  \
///             Duration: 00:24:00.00, start: 0.000000, bitrate: 900 kb/s\r\n    \
///             Stream #0:0: Video: hevc (Main), yuv420p, 1920x1080 [SAR 1:1 DAR 16:9], 23.98 fps\r\n";
///
/// let meta = ffscribe_probe::parse(text);
/// let input = meta.input(0).unwrap();
///
/// assert_eq!(input.file_name, "show.mkv");
/// assert_eq!(input.container_format, "mkv");
/// assert_eq!(input.duration(), Some("00:24:00.00"));
/// assert_eq!(input.resolution.unwrap().to_string(), "1920x1080");
/// ```
pub fn parse(text: &str) -> MediaMetadata {
    MetadataParser::new(text).run()
}

/// Parser state: the part of the buffer not consumed yet.
struct MetadataParser {
    buffer: String,
}

impl MetadataParser {
    fn new(text: &str) -> Self {
        Self {
            buffer: normalize_line_endings(text),
        }
    }

    fn run(mut self) -> MediaMetadata {
        let tool_version = self.strip_banner();
        let build_info = self.build_info();

        let mut inputs = Vec::new();
        for input_code in 0.. {
            let marker = input_marker(input_code);
            if !contains(&self.buffer, &marker) {
                break;
            }
            let mut input = self.input_header(input_code, &marker);
            self.input_tags(&mut input);
            self.chapters(&mut input);
            self.streams(&mut input);
            inputs.push(input);
        }

        MediaMetadata {
            tool_version,
            build_info,
            inputs,
        }
    }

    /// Extract `label` and advance the buffer, or `None` if it is absent.
    fn take(&mut self, extractor: &Extractor<'_>, label: &str) -> Option<Extracted> {
        if !contains(&self.buffer, label) {
            return None;
        }
        let extraction = extractor.extract(&self.buffer, label).ok()?;
        self.buffer = extraction.remaining;
        Some(extraction.value)
    }

    /// Whether `label` occurs before `marker` (or anywhere, if `marker` is
    /// `None` or absent).
    fn occurs_before(&self, label: &str, marker: Option<&str>) -> bool {
        let Some(at) = self.buffer.find(label) else {
            return false;
        };
        match marker.and_then(|m| self.buffer.find(m)) {
            Some(boundary) => at < boundary,
            None => true,
        }
    }

    /// The marker among `markers` that occurs first in the buffer.
    fn nearest<'m>(&self, markers: &[&'m str]) -> Option<&'m str> {
        markers
            .iter()
            .filter_map(|m| self.buffer.find(m).map(|at| (at, *m)))
            .min_by_key(|(at, _)| *at)
            .map(|(_, m)| m)
    }

    /// Drop the `<tool> version X` banner and its `built with` line,
    /// returning the version.
    fn strip_banner(&mut self) -> Option<String> {
        let mut version = None;
        let mut kept: Vec<&str> = Vec::new();

        for line in self.buffer.split(CRLF) {
            let trimmed = line.trim_start();
            if version.is_none() {
                if let Some(v) = banner_version(trimmed) {
                    version = Some(v);
                    continue;
                }
            }
            if trimmed.starts_with("built with ") {
                continue;
            }
            kept.push(line);
        }

        let stripped = kept.join(CRLF).trim().to_string();
        if version.is_some() {
            self.buffer = stripped;
        }
        version
    }

    fn build_info(&mut self) -> BTreeMap<String, Extracted> {
        let mut info = BTreeMap::new();
        for &label in BUILD_INFO_LABELS {
            let extractor = if label == CONFIGURATION_LABEL {
                Extractor::new().flag_prefix("--")
            } else {
                Extractor::new()
            };
            if let Some(value) = self.take(&extractor, label) {
                info.insert(label.trim_end_matches(':').to_string(), value);
            }
        }
        info
    }

    fn input_header(&mut self, index: usize, marker: &str) -> InputMetadata {
        let mut input = InputMetadata::new(index);
        // Unsplit, so commas in the file name survive.
        let Some(header) = self.take(&Extractor::new().split_on(""), marker) else {
            return input;
        };
        let raw = header.as_scalar().unwrap_or_default();

        let (formats, path) = match raw.find("from ") {
            Some(at) => (&raw[..at], Some(&raw[at + "from ".len()..])),
            None => (raw, None),
        };

        input.formats = formats
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(String::from)
            .collect();
        if let Some(path) = path {
            input.file_path = clean_file_path(path);
            input.file_name = paths::file_name(&input.file_path).to_string();
            input.container_format = paths::extension(&input.file_name).to_string();
        }
        input
    }

    /// The `Metadata:` block and `Duration:` line that follow an input header.
    fn input_tags(&mut self, input: &mut InputMetadata) {
        let first_stream = stream_prefix(input.index);
        let next_input = input_marker(input.index + 1);
        let markers = [first_stream.as_str(), next_input.as_str(), CHAPTERS_LABEL];
        let mut lines = Vec::new();

        let boundary = self.nearest(&markers);
        if self.occurs_before(METADATA_LABEL, boundary) {
            let extractor = match boundary {
                Some(b) => Extractor::new().terminator(b),
                None => Extractor::new().to_end(),
            }
            .split_on(CRLF);
            if let Some(block) = self.take(&extractor, METADATA_LABEL) {
                lines.extend(block.entries().into_iter().map(String::from));
            }
        }

        // No Metadata block: the Duration line stands on its own.
        let boundary = self.nearest(&markers);
        if !lines.iter().any(|l| l.contains(DURATION_LABEL))
            && self.occurs_before(DURATION_LABEL, boundary)
        {
            if let Some(parts) = self.take(&Extractor::new(), DURATION_LABEL) {
                lines.push(format!("{DURATION_LABEL} {}", parts.entries().join(", ")));
            }
        }

        fold_tag_lines(lines, &mut input.tags);
    }

    /// The `Chapters:` section between the input tags and the first stream.
    ///
    /// Chapter `Metadata:` blocks are consumed here so they are never
    /// mistaken for input or stream tags.
    fn chapters(&mut self, input: &mut InputMetadata) {
        let first_stream = stream_prefix(input.index);
        let next_input = input_marker(input.index + 1);

        let boundary = self.nearest(&[first_stream.as_str(), next_input.as_str()]);
        if !self.occurs_before(CHAPTERS_LABEL, boundary) {
            return;
        }
        let extractor = match boundary {
            Some(b) => Extractor::new().terminator(b),
            None => Extractor::new().to_end(),
        }
        .split_on(CRLF);

        if let Some(section) = self.take(&extractor, CHAPTERS_LABEL) {
            input.chapters = fold_chapters(section.entries());
        }
    }

    fn streams(&mut self, input: &mut InputMetadata) {
        let next_input = input_marker(input.index + 1);

        for stream_code in 0.. {
            let marker = stream_marker(input.index, stream_code);
            let Some(descriptor) = self.take(&Extractor::new(), &marker) else {
                break;
            };

            let mut stream = StreamMetadata::from_descriptor(stream_code, &descriptor);
            if input.resolution.is_none() {
                input.resolution = stream.resolution;
            }

            let next_stream = stream_marker(input.index, stream_code + 1);
            self.stream_tags(&mut stream, &next_stream, &next_input);

            input
                .streams
                .push((format!("{}:{}", input.index, stream_code), stream));
        }
    }

    /// The `Metadata:` block following a stream line, if any.
    fn stream_tags(&mut self, stream: &mut StreamMetadata, next_stream: &str, next_input: &str) {
        let boundary = [next_stream, next_input]
            .into_iter()
            .find(|m| contains(&self.buffer, m));

        let block = match boundary {
            Some(b) if self.occurs_before(METADATA_LABEL, Some(b)) => {
                let extractor = Extractor::new().terminator(b).split_on(CRLF);
                self.take(&extractor, METADATA_LABEL)
            }
            Some(_) => None,
            // Last stream of the last input: a loose trailing block.
            None => {
                let extractor = Extractor::new().to_end().split_on(CRLF);
                self.take(&extractor, METADATA_LABEL)
            }
        };

        if let Some(block) = block {
            fold_tag_lines(block.entries().into_iter().map(String::from), &mut stream.tags);
        }
    }
}

/// Split `key : value` lines into `tags`.
///
/// A `Duration:` line yields `Duration`, and its remaining comma-separated
/// parts (`start: ..`, `bitrate: ..`) are queued as ordinary lines.
fn fold_tag_lines(lines: impl IntoIterator<Item = String>, tags: &mut BTreeMap<String, String>) {
    let mut queue: VecDeque<String> = lines.into_iter().collect();

    while let Some(line) = queue.pop_front() {
        if let Some(at) = line.find(DURATION_LABEL) {
            let rest = &line[at + DURATION_LABEL.len()..];
            let mut parts = rest.split(',');
            if let Some(duration) = parts.next().map(str::trim).filter(|d| !d.is_empty()) {
                tags.insert("Duration".to_string(), duration.to_string());
            }
            queue.extend(parts.map(|p| p.trim().to_string()));
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if !key.is_empty() && !value.is_empty() {
            tags.insert(key.to_string(), value.to_string());
        }
    }
}

/// Group `Chapter #N:M: start S, end E` lines with the tag lines below them.
fn fold_chapters(lines: Vec<&str>) -> Vec<Chapter> {
    let mut chapters: Vec<Chapter> = Vec::new();
    let mut tag_lines: Vec<Vec<String>> = Vec::new();

    for line in lines {
        if let Some(rest) = line.strip_prefix(CHAPTER_PREFIX) {
            let mut chapter = Chapter::new(chapters.len());
            let span = rest.split_once(": ").map(|(_, span)| span).unwrap_or_default();
            for part in span.split(',').map(str::trim) {
                if let Some(start) = part.strip_prefix("start ") {
                    chapter.start = Some(start.trim().to_string());
                } else if let Some(end) = part.strip_prefix("end ") {
                    chapter.end = Some(end.trim().to_string());
                }
            }
            chapters.push(chapter);
            tag_lines.push(Vec::new());
        } else if line != METADATA_LABEL {
            if let Some(lines) = tag_lines.last_mut() {
                lines.push(line.to_string());
            }
        }
    }

    for (chapter, lines) in chapters.iter_mut().zip(tag_lines) {
        fold_tag_lines(lines, &mut chapter.tags);
    }
    chapters
}

/// `ffprobe version 4.2.1 Copyright ...` -> `4.2.1`.
fn banner_version(line: &str) -> Option<String> {
    BANNER_TOOLS.iter().find_map(|tool| {
        let rest = line.strip_prefix(tool)?.strip_prefix(" version ")?;
        rest.split_whitespace().next().map(String::from)
    })
}

/// `'C:\movies\a.mp4':` -> `C:\movies\a.mp4`.
fn clean_file_path(raw: &str) -> String {
    let path = raw.trim();
    let path = path.strip_suffix(':').unwrap_or(path).trim();
    path.trim_matches(|c| c == '\'' || c == '"').to_string()
}

fn normalize_line_endings(text: &str) -> String {
    text.replace(CRLF, "\n").replace('\n', CRLF)
}

fn input_marker(input: usize) -> String {
    format!("Input #{input}")
}

fn stream_prefix(input: usize) -> String {
    format!("Stream #{input}:")
}

fn stream_marker(input: usize, stream: usize) -> String {
    format!("Stream #{input}:{stream}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Resolution, StreamKind};

    #[test]
    fn test_fold_tag_lines_duration() {
        let mut tags = BTreeMap::new();
        fold_tag_lines(
            vec![
                "major_brand     : isom".to_string(),
                "Duration: 00:23:40.06, start: 0.000000, bitrate: 1108 kb/s".to_string(),
                "creation_time   : 2019-01-01T10:00:00.000000Z".to_string(),
            ],
            &mut tags,
        );
        assert_eq!(tags["major_brand"], "isom");
        assert_eq!(tags["Duration"], "00:23:40.06");
        assert_eq!(tags["start"], "0.000000");
        assert_eq!(tags["bitrate"], "1108 kb/s");
        assert_eq!(tags["creation_time"], "2019-01-01T10:00:00.000000Z");
    }

    #[test]
    fn test_fold_tag_lines_skips_bare_lines() {
        let mut tags = BTreeMap::new();
        fold_tag_lines(
            vec!["Side data:".to_string(), "no colon here".to_string()],
            &mut tags,
        );
        assert!(tags.is_empty());
    }

    #[test]
    fn test_banner_version() {
        assert_eq!(
            banner_version("ffprobe version 4.2.1 Copyright (c) 2007-2019").as_deref(),
            Some("4.2.1")
        );
        assert_eq!(
            banner_version("ffmpeg version n6.1 Copyright").as_deref(),
            Some("n6.1")
        );
        assert_eq!(banner_version("Input #0, mov"), None);
    }

    #[test]
    fn test_clean_file_path() {
        assert_eq!(clean_file_path(" 'naruto.mp4':"), "naruto.mp4");
        assert_eq!(
            clean_file_path("'C:\\res\\movies\\naruto.mp4':"),
            "C:\\res\\movies\\naruto.mp4"
        );
        assert_eq!(clean_file_path("\"a b.mkv\":"), "a b.mkv");
    }

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings("a\nb\r\nc"), "a\r\nb\r\nc");
    }

    #[test]
    fn test_empty_text() {
        let meta = parse("");
        assert!(meta.is_empty());
        assert!(meta.build_info.is_empty());
        assert!(meta.tool_version.is_none());
    }

    #[test]
    fn test_no_input_marker() {
        let meta = parse("ffprobe version 6.0\r\nshow.mkv: No such file or directory\r\n");
        assert_eq!(meta.tool_version.as_deref(), Some("6.0"));
        assert!(meta.inputs.is_empty());
    }

    #[test]
    fn test_input_without_streams() {
        let text = "Input #0, wav, from 'silence':\r\n  Duration: N/A, bitrate: N/A\r\n";
        let meta = parse(text);
        assert_eq!(meta.inputs.len(), 1);
        let input = &meta.inputs[0];
        assert_eq!(input.file_name, "silence");
        assert_eq!(input.container_format, "");
        assert_eq!(input.formats, vec!["wav"]);
        assert_eq!(input.duration(), Some("N/A"));
        assert!(input.streams.is_empty());
        assert!(input.resolution.is_none());
    }

    #[test]
    fn test_stream_metadata_block() {
        let text = "Input #0, mov,mp4, from 'a.mp4':\r\n\
                    \x20 Duration: 00:00:10.00, start: 0.000000, bitrate: 500 kb/s\r\n\
                    \x20   Stream #0:0(und): Video: h264, yuv420p, 640x360 [SAR 1:1 DAR 16:9], 400 kb/s\r\n\
                    \x20   Metadata:\r\n\
                    \x20     handler_name    : VideoHandler\r\n\
                    \x20   Stream #0:1(eng): Audio: aac (LC), 44100 Hz, stereo, fltp, 96 kb/s\r\n\
                    \x20   Metadata:\r\n\
                    \x20     handler_name    : SoundHandler\r\n";
        let meta = parse(text);
        let input = meta.input(0).unwrap();

        assert_eq!(input.streams.len(), 2);
        let video = input.stream("0:0").unwrap();
        assert_eq!(video.kind, StreamKind::Video);
        assert_eq!(video.tags["handler_name"], "VideoHandler");
        assert_eq!(video.resolution, Some(Resolution::new(640, 360)));

        let audio = input.stream("0:1").unwrap();
        assert_eq!(audio.kind, StreamKind::Audio);
        assert_eq!(audio.language.as_deref(), Some("eng"));
        assert_eq!(audio.tags["handler_name"], "SoundHandler");
        assert!(audio.resolution.is_none());
    }
}
