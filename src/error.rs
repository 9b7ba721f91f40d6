// src/error.rs

//! Error types for pkgcook

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while turning a recipe into packages
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O failure with context
    #[error("I/O error: {0}")]
    IoError(String),

    /// Recipe or metadata could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Recipe is structurally valid but semantically unusable
    #[error("Invalid recipe: {0}")]
    InvalidRecipe(String),

    /// Recipe requests a tool the registry does not know
    #[error("Tool {0:?} not found")]
    ToolNotFound(String),

    /// Version string is not a semantic version
    #[error("Invalid version {version:?}: {reason}")]
    InvalidVersion { version: String, reason: String },

    /// Plain HTTP source
    #[error("Insecure scheme {0:?} not supported in package files")]
    InsecureScheme(String),

    /// Source scheme with no acquisition method
    #[error("Unsupported source scheme {0:?}")]
    UnsupportedScheme(String),

    /// Source string did not resolve to a usable URL
    #[error("Invalid source {url:?}: {reason}")]
    InvalidSource { url: String, reason: String },

    /// A templated field failed to expand
    #[error("Template error in {field}: {message}")]
    Template { field: String, message: String },

    /// HTTP download failed
    #[error("Download error: {0}")]
    DownloadError(String),

    /// A source could not be materialized
    #[error("Failed to fetch {url}: {reason}")]
    SourceFetchFailed { url: String, reason: String },

    /// Fetched content does not match the pinned digest
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// A helper subprocess exited unsuccessfully
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// Rule graph or metadata could not be produced
    #[error("Generation error: {0}")]
    GenerationError(String),

    /// The external build runner failed; `output` is its combined stdout/stderr
    #[error("Build failed:\n{output}")]
    BuildFailed { output: String },

    /// Kitchen configuration is unusable
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::ParseError(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::GenerationError(e.to_string())
    }
}
