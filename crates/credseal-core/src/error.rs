use std::{fmt, path::PathBuf};

use thiserror::Error;

use crate::protector::ProtectError;

/// Which of the two deserialization passes rejected the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    /// The text read from disk.
    Raw,
    /// The canonical text produced after sealing.
    Final,
}

impl fmt::Display for ParseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseStage::Raw => f.write_str("raw"),
            ParseStage::Final => f.write_str("final"),
        }
    }
}

/// Errors surfaced by an encrypted record loader. None are retried.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Options were rejected before any file I/O.
    #[error("invalid configuration: {reason}")]
    Config { reason: String },
    /// The file is missing, unreadable or unwritable.
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Malformed content, or content that does not match the record shape.
    #[error("format error ({stage} parse): {source}")]
    Format {
        stage: ParseStage,
        #[source]
        source: serde_json::Error,
    },
    /// No protector could be created for the configured purpose.
    #[error("protector unavailable for purpose `{purpose}`: {source}")]
    Protector {
        purpose: String,
        #[source]
        source: ProtectError,
    },
    /// The protector refused to protect or unprotect a sensitive field.
    #[error("crypto error on field `{field}`: {source}")]
    Crypto {
        field: &'static str,
        #[source]
        source: ProtectError,
    },
}

impl LoadError {
    pub fn config(reason: impl Into<String>) -> Self {
        LoadError::Config {
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }
}
