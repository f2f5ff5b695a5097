//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric variable could not be parsed.
    #[error("failed to parse {name}='{value}': {reason}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// `RESEMBLE_DECISION_RULE` is neither `ternary` nor `distance`.
    #[error("invalid decision rule '{value}': expected 'ternary' or 'distance'")]
    InvalidDecisionRule { value: String },

    /// A value is outside its allowed range.
    #[error("{name} out of range: {reason}")]
    OutOfRange { name: &'static str, reason: String },

    /// A required environment variable was not set.
    #[error("missing required environment variable: {name}")]
    MissingEnvVar { name: &'static str },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a file (when a file was expected).
    #[error("path is not a file: {path}")]
    NotAFile { path: PathBuf },
}
