use std::{fmt, path::PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Seed used when no marker seed is configured.
pub const DEFAULT_MARKER_SEED: &str = "2x2";

/// Configuration for one encrypted JSON file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProviderOptions {
    /// Path of the JSON file; rewritten in place when plaintext fields are found.
    pub file_path: PathBuf,
    /// Scopes the protector's key material; must match between writer and reader.
    pub purpose: String,
    /// Seed of the prefix that flags already protected values.
    #[serde(default)]
    pub marker_seed: Option<String>,
}

impl ProviderOptions {
    pub fn new(file_path: impl Into<PathBuf>, purpose: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            purpose: purpose.into(),
            marker_seed: None,
        }
    }

    pub fn with_marker_seed(mut self, seed: impl Into<String>) -> Self {
        self.marker_seed = Some(seed.into());
        self
    }

    /// Reject missing required settings before any file I/O happens.
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.file_path.as_os_str().is_empty() {
            return Err(LoadError::config("file path is required"));
        }
        if self.purpose.trim().is_empty() {
            return Err(LoadError::config("purpose is required"));
        }
        if matches!(self.marker_seed.as_deref(), Some("")) {
            return Err(LoadError::config("marker seed must not be empty"));
        }
        Ok(())
    }

    /// Derive the protection marker from the configured seed, or the default one.
    pub fn marker(&self) -> ProtectionMarker {
        ProtectionMarker::from_seed(self.marker_seed.as_deref().unwrap_or(DEFAULT_MARKER_SEED))
    }
}

/// Prefix distinguishing protected values from plaintext without decrypting them.
///
/// The marker is `base64(seed)`. Nothing prevents a plaintext value from starting
/// with it; pick a seed that real values in the file cannot begin with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProtectionMarker(String);

impl ProtectionMarker {
    pub fn from_seed(seed: &str) -> Self {
        Self(STANDARD.encode(seed.as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_marked(&self, value: &str) -> bool {
        value.starts_with(&self.0)
    }

    /// Returns the ciphertext behind the marker, if the value carries it.
    pub fn strip<'a>(&self, value: &'a str) -> Option<&'a str> {
        value.strip_prefix(self.0.as_str())
    }

    pub fn apply(&self, ciphertext: &str) -> String {
        let mut out = String::with_capacity(self.0.len() + ciphertext.len());
        out.push_str(&self.0);
        out.push_str(ciphertext);
        out
    }
}

impl Default for ProtectionMarker {
    fn default() -> Self {
        Self::from_seed(DEFAULT_MARKER_SEED)
    }
}

impl fmt::Display for ProtectionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_marker_is_base64_of_default_seed() {
        let options = ProviderOptions::new("creds.json", "app:creds");
        assert_eq!(options.marker().as_str(), "Mngy");
        assert_eq!(options.marker(), ProtectionMarker::default());
    }

    #[test]
    fn custom_seed_changes_marker() {
        let options = ProviderOptions::new("creds.json", "app:creds").with_marker_seed("enc:");
        assert_eq!(options.marker().as_str(), "ZW5jOg==");
    }

    #[test]
    fn strip_and_apply_are_inverse() {
        let marker = ProtectionMarker::default();
        let sealed = marker.apply("abc");
        assert!(marker.is_marked(&sealed));
        assert_eq!(marker.strip(&sealed), Some("abc"));
        assert_eq!(marker.strip("plain"), None);
        assert_eq!(marker.strip("Mngy"), Some(""));
    }

    #[test]
    fn validate_rejects_missing_settings() {
        let missing_path = ProviderOptions::new("", "app:creds");
        assert!(matches!(missing_path.validate(), Err(LoadError::Config { .. })));

        let blank_purpose = ProviderOptions::new("creds.json", "  ");
        assert!(matches!(blank_purpose.validate(), Err(LoadError::Config { .. })));

        let empty_seed = ProviderOptions::new("creds.json", "app:creds").with_marker_seed("");
        assert!(matches!(empty_seed.validate(), Err(LoadError::Config { .. })));

        ProviderOptions::new("creds.json", "app:creds")
            .validate()
            .expect("valid options");
    }

    #[test]
    fn deserializes_without_marker_seed() {
        let options: ProviderOptions =
            serde_json::from_str(r#"{"file_path":"creds.json","purpose":"app:creds"}"#)
                .expect("parse");
        assert_eq!(options.marker_seed, None);
    }
}
