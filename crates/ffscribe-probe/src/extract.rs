//! Labelled segment extraction over a diagnostic text buffer.
//!
//! An [`Extractor`] pulls the text that follows a label (up to a terminator)
//! out of a buffer and hands back both the extracted value and the buffer
//! with that segment consumed, so extractions can be chained.
//!
//! Consumption is by content: the first occurrence of the label and then the
//! first occurrence of the extracted text are removed from the buffer. This
//! skips over intervening unlabelled text, but a value that also appears
//! earlier in the buffer is removed at that earlier position instead.

use std::fmt;

use crate::error::{ParseError, Result};

/// Line terminator used by the probe tool's diagnostic output.
pub const CRLF: &str = "\r\n";

/// A value pulled out of the buffer.
///
/// Whether a value is a list is decided once, at extraction time, by the
/// presence of the split separator.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Extracted {
    /// A single value with no separator in it.
    Scalar(String),
    /// The non-empty, trimmed pieces of a separated value.
    Sequence(Vec<String>),
}

impl Extracted {
    /// The value if it is a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Extracted::Scalar(s) => Some(s),
            Extracted::Sequence(_) => None,
        }
    }

    /// The entries if the value is a sequence.
    pub fn as_sequence(&self) -> Option<&[String]> {
        match self {
            Extracted::Scalar(_) => None,
            Extracted::Sequence(v) => Some(v),
        }
    }

    /// Whether the value was split into a sequence.
    pub fn is_sequence(&self) -> bool {
        matches!(self, Extracted::Sequence(_))
    }

    /// View the value as a list of entries. A non-empty scalar is a
    /// one-entry list; an empty scalar has no entries.
    pub fn entries(&self) -> Vec<&str> {
        match self {
            Extracted::Scalar(s) if s.is_empty() => Vec::new(),
            Extracted::Scalar(s) => vec![s.as_str()],
            Extracted::Sequence(v) => v.iter().map(String::as_str).collect(),
        }
    }

    /// Whether the value holds no text at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Extracted::Scalar(s) => s.is_empty(),
            Extracted::Sequence(v) => v.is_empty(),
        }
    }
}

impl fmt::Display for Extracted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extracted::Scalar(s) => f.write_str(s),
            Extracted::Sequence(v) => f.write_str(&v.join(", ")),
        }
    }
}

/// Result of a single extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// The extracted value.
    pub value: Extracted,
    /// The input buffer with the label and the extracted text removed.
    pub remaining: String,
}

/// Configurable extraction primitive.
///
/// # Example
///
/// ```
/// use ffscribe_probe::{Extracted, Extractor};
///
/// let buffer = "  libavutil      56. 31.100 / 56. 31.100\r\n  libavcodec     58. 54.100";
/// let out = Extractor::new().extract(buffer, "libavutil").unwrap();
///
/// assert_eq!(out.value, Extracted::Scalar("56. 31.100 / 56. 31.100".into()));
/// assert_eq!(out.remaining, "libavcodec     58. 54.100");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extractor<'a> {
    terminator: Option<&'a str>,
    split_on: &'a str,
    flag_prefix: Option<&'a str>,
}

impl Default for Extractor<'_> {
    fn default() -> Self {
        Self {
            terminator: Some(CRLF),
            split_on: ",",
            flag_prefix: None,
        }
    }
}

impl<'a> Extractor<'a> {
    /// Extractor reading to the end of the line and splitting on `,`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the extracted segment at the next occurrence of `terminator`.
    pub fn terminator(mut self, terminator: &'a str) -> Self {
        self.terminator = Some(terminator);
        self
    }

    /// Extract everything after the label up to the end of the buffer.
    pub fn to_end(mut self) -> Self {
        self.terminator = None;
        self
    }

    /// Separator that turns a value into a [`Extracted::Sequence`].
    pub fn split_on(mut self, separator: &'a str) -> Self {
        self.split_on = separator;
        self
    }

    /// Treat `prefix` as an additional separator, as in
    /// `--enable-gpl --enable-libx264`.
    pub fn flag_prefix(mut self, prefix: &'a str) -> Self {
        self.flag_prefix = Some(prefix);
        self
    }

    /// Extract the segment following `label`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::LabelNotFound`] if `label` does not occur in
    /// `buffer`.
    pub fn extract(&self, buffer: &str, label: &str) -> Result<Extraction> {
        let start = buffer
            .find(label)
            .ok_or_else(|| ParseError::label_not_found(label))?
            + label.len();

        let tail = &buffer[start..];
        let end = match self.terminator {
            Some(t) if !t.is_empty() => tail.find(t).unwrap_or(tail.len()),
            _ => tail.len(),
        };
        let candidate = tail[..end].trim();

        Ok(Extraction {
            value: self.classify(candidate),
            remaining: consume(buffer, label, candidate),
        })
    }

    fn classify(&self, candidate: &str) -> Extracted {
        let mut text = candidate.to_string();

        if let Some(prefix) = self.flag_prefix.filter(|p| !p.is_empty()) {
            text = text.replace(prefix, self.split_on);
        }

        if self.split_on.is_empty() {
            return Extracted::Scalar(text);
        }

        let padded = format!(" {}", self.split_on);
        while text.contains(&padded) {
            text = text.replace(&padded, self.split_on);
        }

        if text.contains(self.split_on) {
            Extracted::Sequence(
                text.split(self.split_on)
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(String::from)
                    .collect(),
            )
        } else {
            Extracted::Scalar(text)
        }
    }
}

/// Remove the first `label` and then the first `candidate` from `buffer`.
fn consume(buffer: &str, label: &str, candidate: &str) -> String {
    let mut rest = buffer.replacen(label, "", 1);
    if !candidate.is_empty() {
        rest = rest.replacen(candidate, "", 1);
    }
    rest.trim().to_string()
}

/// Presence probe used to guard an extraction.
pub fn contains(buffer: &str, label: &str) -> bool {
    buffer.contains(label)
}

/// Extract `label` with the default options (line terminator, `,` split).
pub fn extract(buffer: &str, label: &str) -> Result<Extraction> {
    Extractor::new().extract(buffer, label)
}
