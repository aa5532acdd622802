//! Assembles a [`TranscodeJob`] from command-line options.

use std::path::Path;

use ffscribe_av::{FormatError, FormatRegistry, TranscodeJob};

/// Parse a `FLAG=VALUE` override. A bare `FLAG` sets a flag with no value.
pub fn parse_flag_assignment(s: &str) -> Result<(String, String), String> {
    let (flag, value) = s.split_once('=').unwrap_or((s, ""));
    let flag = flag.trim();
    if flag.is_empty() {
        return Err(format!("invalid flag assignment {s:?}: expected FLAG=VALUE"));
    }
    Ok((flag.to_string(), value.to_string()))
}

/// Build the job: the named profile first, then each override in order.
pub fn build_job(
    registry: &FormatRegistry,
    input: &Path,
    profile: Option<&str>,
    overrides: &[(String, String)],
    verbose: bool,
) -> Result<TranscodeJob, FormatError> {
    let mut job = TranscodeJob::new(input).verbose(verbose);

    if let Some(name) = profile {
        job.apply_named(registry, name)?;
    }
    for (flag, value) in overrides {
        job.add_command(flag.as_str(), value.as_str());
    }

    Ok(job)
}
