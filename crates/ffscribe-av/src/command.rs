//! Transcode job builder and command line rendering.

use std::path::{Path, PathBuf};

use crate::error::FormatError;
use crate::formats::{EncodeProfile, FormatRegistry};

/// An input file plus the ordered encoder flags to apply to it.
///
/// Flags keep the position of their first insertion; setting a flag again
/// replaces its value in place.
///
/// # Example
///
/// ```
/// use ffscribe_av::{FormatRegistry, TranscodeJob};
///
/// let registry = FormatRegistry::new();
/// let mut job = TranscodeJob::new("in.mp4");
/// job.apply_named(&registry, "360p").unwrap();
///
/// let line = job.render("ffmpeg", "out.mp4");
/// assert!(line.starts_with("ffmpeg -y -i \"in.mp4\" -c:a aac -ac 2 -ab 64k"));
/// assert!(line.ends_with("-vf \"scale=-1:360\" \"out.mp4\""));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscodeJob {
    input: PathBuf,
    commands: Vec<(String, String)>,
    verbose: bool,
}

impl TranscodeJob {
    /// Create a job for `input` with no flags.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Default::default()
        }
    }

    /// Echo the command and the tool's output through the log at `info`.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Whether the job was marked verbose.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// The input file.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Replace the input file.
    pub fn set_input(&mut self, input: impl Into<PathBuf>) -> &mut Self {
        self.input = input.into();
        self
    }

    /// Flags in application order.
    pub fn commands(&self) -> &[(String, String)] {
        &self.commands
    }

    /// Current value of `flag`.
    pub fn get(&self, flag: &str) -> Option<&str> {
        self.commands
            .iter()
            .find(|(k, _)| k == flag)
            .map(|(_, v)| v.as_str())
    }

    /// Set `flag` to `value`. An empty value renders the bare flag.
    pub fn add_command(&mut self, flag: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let (flag, value) = (flag.into(), value.into());
        match self.commands.iter_mut().find(|(k, _)| *k == flag) {
            Some(slot) => slot.1 = value,
            None => self.commands.push((flag, value)),
        }
        self
    }

    /// Merge every flag of `profile` without validating it.
    pub fn apply_profile(&mut self, profile: &EncodeProfile) -> &mut Self {
        for (flag, value) in profile.flags() {
            self.add_command(flag.as_str(), value.as_str());
        }
        self
    }

    /// Merge `profile` after checking it matches a registered profile.
    ///
    /// # Errors
    ///
    /// [`FormatError::UnknownProfile`] if the registry holds no profile with
    /// the same flags. The job is unchanged in that case.
    pub fn apply_existing(
        &mut self,
        registry: &FormatRegistry,
        profile: &EncodeProfile,
    ) -> Result<&mut Self, FormatError> {
        for (flag, value) in registry.apply_existing(profile)? {
            self.add_command(flag, value);
        }
        Ok(self)
    }

    /// Merge the registered profile called `name`.
    ///
    /// # Errors
    ///
    /// [`FormatError::UnknownProfile`] if no profile has that name.
    pub fn apply_named(
        &mut self,
        registry: &FormatRegistry,
        name: &str,
    ) -> Result<&mut Self, FormatError> {
        let profile = registry
            .get(name)
            .ok_or_else(|| FormatError::unknown(name))?;
        Ok(self.apply_profile(&profile))
    }

    /// Render the full command line for `tool` writing to `output`.
    ///
    /// Paths are wrapped in double quotes; flag values are emitted verbatim,
    /// so values that need quoting must carry their own quotes.
    pub fn render(&self, tool: impl AsRef<Path>, output: impl AsRef<Path>) -> String {
        let mut line = format!(
            "{} -y -i \"{}\"",
            tool_name(tool.as_ref()),
            self.input.display()
        );
        for (flag, value) in &self.commands {
            line.push(' ');
            line.push_str(flag);
            if !value.is_empty() {
                line.push(' ');
                line.push_str(value);
            }
        }
        line.push_str(&format!(" \"{}\"", output.as_ref().display()));
        line
    }
}

/// Tool paths containing whitespace are quoted so the shell sees one word.
pub(crate) fn tool_name(tool: &Path) -> String {
    let name = tool.display().to_string();
    if name.contains(char::is_whitespace) {
        format!("\"{name}\"")
    } else {
        name
    }
}
