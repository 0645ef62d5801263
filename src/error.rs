//! Error types for the network graph pipeline
//!
//! Classification and layout never fail: every resolution step has an
//! explicit fallback. Errors only surface at the edges of the system, when
//! rule tables are loaded or compiled and when snapshots are read.

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read snapshot {path}: {source}")]
    SnapshotIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse snapshot: {0}")]
    SnapshotParse(#[from] serde_json::Error),
}

/// Errors raised while loading or compiling rule tables
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    ParseError(String),

    #[error("Invalid pattern '{pattern}' in rule '{rule}': {source}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Duplicate category id '{0}'")]
    DuplicateCategory(String),
}

impl ConfigError {
    pub(crate) fn invalid_pattern(rule: &str, pattern: &str, source: regex::Error) -> Self {
        ConfigError::InvalidPattern {
            rule: rule.to_string(),
            pattern: pattern.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
