//! Error types for the masking engine

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Engine errors
///
/// Only construction-time operations return these. Queries against a loaded
/// rule set never fail; they answer "no match" instead.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid atom: {0}")]
    InvalidAtom(String),

    #[error("Invalid package version: {0}")]
    InvalidVersion(String),

    #[error("Unknown version operator: {0}")]
    UnknownOperator(String),

    #[error("Invalid glob pattern {pattern}: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid keyword: {0}")]
    InvalidKeyword(String),

    #[error("Configuration not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}
