//! Error types for sessiondoc-core
//!
//! Extraction never fails: every extractor is total over its input text.
//! These variants cover the edges of the pipeline, namely loading source
//! text, reading configuration, and handing records to a renderer.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the sessiondoc-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested log or diff file does not exist
    #[error("log file not found: {}", .0.display())]
    LogNotFound(PathBuf),

    /// JSON error while reading or writing the interchange form
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A renderer asked for an output format that does not exist
    #[error("unknown format: {0}. Use 'json', 'summary', or 'stats'")]
    UnknownFormat(String),

    /// A manually supplied record carried an invalid field value
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Result type alias for sessiondoc-core
pub type Result<T> = std::result::Result<T, Error>;
