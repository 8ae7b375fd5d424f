//! SVA-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, SvaError>;

/// Top-level error type for svcalert.
#[derive(Debug, Error)]
pub enum SvaError {
    #[error("[SVA-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[SVA-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[SVA-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[SVA-2001] status fetch failure from `{command}`: {details}")]
    Fetch { command: String, details: String },

    #[error("[SVA-2002] malformed status line {line_number}: {content:?}")]
    MalformedStatusLine { line_number: usize, content: String },

    #[error("[SVA-3001] notification transport failure: {details}")]
    Transport { details: String },

    #[error("[SVA-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[SVA-3101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[SVA-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl SvaError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "SVA-1001",
            Self::MissingConfig { .. } => "SVA-1002",
            Self::ConfigParse { .. } => "SVA-1003",
            Self::Fetch { .. } => "SVA-2001",
            Self::MalformedStatusLine { .. } => "SVA-2002",
            Self::Transport { .. } => "SVA-3001",
            Self::Io { .. } => "SVA-3002",
            Self::Serialization { .. } => "SVA-3101",
            Self::Runtime { .. } => "SVA-3900",
        }
    }

    /// Whether retrying on the next scheduled run might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::Transport { .. } | Self::Io { .. } | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<toml::de::Error> for SvaError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for SvaError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}
