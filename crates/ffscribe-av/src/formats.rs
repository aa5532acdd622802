//! Named encode profiles and the registry that validates them.
//!
//! Three built-in profiles (`720p`, `540p`, `360p`) are always present and
//! cannot be replaced. Custom profiles are added at runtime through
//! [`FormatRegistry::register_custom`]; the registry rejects duplicates both
//! by name and by flag content.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// A named, ordered set of encoder flags.
///
/// Flag keys are unique; a repeated key keeps its first position and takes
/// the last value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeProfile {
    name: String,
    flags: Vec<(String, String)>,
}

impl EncodeProfile {
    /// Build a profile from `(flag, value)` pairs.
    pub fn new<K, V>(name: impl Into<String>, flags: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut ordered: Vec<(String, String)> = Vec::new();
        for (key, value) in flags {
            let (key, value) = (key.into(), value.into());
            match ordered.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => ordered.push((key, value)),
            }
        }
        Self {
            name: name.into(),
            flags: ordered,
        }
    }

    /// Profile name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flags in declaration order.
    pub fn flags(&self) -> &[(String, String)] {
        &self.flags
    }

    /// Value of a single flag.
    pub fn get(&self, flag: &str) -> Option<&str> {
        self.flags
            .iter()
            .find(|(k, _)| k == flag)
            .map(|(_, v)| v.as_str())
    }

    /// Structural equality: same flag/value pairs, regardless of order and
    /// name.
    pub fn same_flags(&self, other: &EncodeProfile) -> bool {
        self.flag_set() == other.flag_set()
    }

    fn flag_set(&self) -> BTreeMap<&str, &str> {
        self.flags
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

fn builtin(
    name: &str,
    audio_bitrate: &str,
    sample_rate: &str,
    bufsize: &str,
    video_bitrate: &str,
    height: u32,
) -> EncodeProfile {
    EncodeProfile::new(
        name,
        [
            ("-c:a", "aac".to_string()),
            ("-ac", "2".to_string()),
            ("-ab", audio_bitrate.to_string()),
            ("-ar", sample_rate.to_string()),
            ("-c:v", "libx264".to_string()),
            ("-x264opts", "\"keyint=24:min-keyint=24:no-scenecut\"".to_string()),
            ("-b:v", video_bitrate.to_string()),
            ("-maxrate", video_bitrate.to_string()),
            ("-bufsize", bufsize.to_string()),
            ("-vf", format!("\"scale=-1:{height}\"")),
        ],
    )
}

/// Registry of built-in and custom encode profiles.
///
/// Reads of the built-ins never take a lock. Registrations are serialized
/// by a single write lock, so concurrent duplicate registrations cannot
/// both succeed.
#[derive(Debug, Default)]
pub struct FormatRegistry {
    custom: RwLock<Vec<EncodeProfile>>,
}

impl FormatRegistry {
    /// A registry holding only the built-in profiles.
    pub fn new() -> Self {
        Self::default()
    }

    /// A process-wide registry, created on first use.
    pub fn shared() -> &'static FormatRegistry {
        static SHARED: OnceLock<FormatRegistry> = OnceLock::new();
        SHARED.get_or_init(FormatRegistry::new)
    }

    /// The built-in profiles, in order `720p`, `540p`, `360p`.
    pub fn builtins() -> &'static [EncodeProfile] {
        static BUILTINS: OnceLock<Vec<EncodeProfile>> = OnceLock::new();
        BUILTINS.get_or_init(|| {
            vec![
                builtin("720p", "256k", "48000", "1000k", "1500k", 720),
                builtin("540p", "128k", "44100", "500k", "800k", 540),
                builtin("360p", "64k", "22050", "400k", "400k", 360),
            ]
        })
    }

    /// Whether `name` belongs to a built-in profile.
    pub fn is_builtin(name: &str) -> bool {
        Self::builtins().iter().any(|p| p.name == name)
    }

    /// Look a profile up by name, built-ins first.
    pub fn get(&self, name: &str) -> Option<EncodeProfile> {
        if let Some(profile) = Self::builtins().iter().find(|p| p.name == name) {
            return Some(profile.clone());
        }
        self.custom.read().iter().find(|p| p.name == name).cloned()
    }

    /// Names of every registered profile.
    pub fn names(&self) -> Vec<String> {
        self.profiles().into_iter().map(|p| p.name).collect()
    }

    /// Snapshot of every registered profile, built-ins first.
    pub fn profiles(&self) -> Vec<EncodeProfile> {
        let mut all = Self::builtins().to_vec();
        all.extend(self.custom.read().iter().cloned());
        all
    }

    /// Snapshot of the custom profiles only.
    pub fn custom_profiles(&self) -> Vec<EncodeProfile> {
        self.custom.read().clone()
    }

    /// Register a custom profile.
    ///
    /// # Errors
    ///
    /// - [`FormatError::InvalidName`] if `name` is blank or names a built-in.
    /// - [`FormatError::InvalidFlags`] if there are no flags or a flag key
    ///   is blank.
    /// - [`FormatError::Duplicate`] if `name` is taken or an existing
    ///   profile has exactly the same flags.
    ///
    /// The registry is unchanged when an error is returned.
    pub fn register_custom<K, V>(
        &self,
        name: &str,
        flags: impl IntoIterator<Item = (K, V)>,
    ) -> Result<(), FormatError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(FormatError::invalid_name("profile name must not be empty"));
        }
        if Self::is_builtin(name) {
            return Err(FormatError::invalid_name(format!(
                "{name} is a built-in profile"
            )));
        }

        let profile = EncodeProfile::new(name, flags);
        if profile.flags.is_empty() {
            return Err(FormatError::invalid_flags(format!(
                "profile {name} has no flags"
            )));
        }
        if profile.flags.iter().any(|(k, _)| k.trim().is_empty()) {
            return Err(FormatError::invalid_flags(format!(
                "profile {name} has an empty flag"
            )));
        }

        let mut custom = self.custom.write();
        if let Some(existing) = custom.iter().find(|p| p.name == name) {
            return Err(FormatError::Duplicate {
                existing: existing.name.clone(),
            });
        }
        if let Some(existing) = Self::builtins()
            .iter()
            .chain(custom.iter())
            .find(|p| p.same_flags(&profile))
        {
            return Err(FormatError::Duplicate {
                existing: existing.name.clone(),
            });
        }

        tracing::debug!(
            profile = name,
            flags = profile.flags.len(),
            "Registered encode profile"
        );
        custom.push(profile);
        Ok(())
    }

    /// Register a custom profile from a dynamically typed value, such as a
    /// table read from a config file.
    ///
    /// # Errors
    ///
    /// [`FormatError::InvalidFlags`] unless `value` is an object whose values
    /// are all strings; otherwise as [`register_custom`](Self::register_custom).
    pub fn register_custom_value(
        &self,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<(), FormatError> {
        let map = value.as_object().ok_or_else(|| {
            FormatError::invalid_flags(format!(
                "profile {name} must be a flag -> value mapping"
            ))
        })?;

        let mut flags = Vec::with_capacity(map.len());
        for (key, value) in map {
            let value = value.as_str().ok_or_else(|| {
                FormatError::invalid_flags(format!(
                    "value of {key} in profile {name} must be a string"
                ))
            })?;
            flags.push((key.clone(), value.to_string()));
        }

        self.register_custom(name, flags)
    }

    /// Whether some registered profile has exactly the flags of `profile`.
    pub fn contains(&self, profile: &EncodeProfile) -> bool {
        Self::builtins().iter().any(|p| p.same_flags(profile))
            || self.custom.read().iter().any(|p| p.same_flags(profile))
    }

    /// Validate `profile` against the registry and return its flags.
    ///
    /// # Errors
    ///
    /// [`FormatError::UnknownProfile`] if no registered profile is
    /// structurally equal to `profile`.
    pub fn apply_existing(
        &self,
        profile: &EncodeProfile,
    ) -> Result<Vec<(String, String)>, FormatError> {
        if self.contains(profile) {
            Ok(profile.flags.clone())
        } else {
            Err(FormatError::unknown(profile.name()))
        }
    }
}
