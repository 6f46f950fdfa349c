// src/error.rs

use thiserror::Error;

/// Core error types for debrepo
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad user input (missing path, not a file, wrong extension, ...)
    #[error("Invalid input: {0}")]
    Input(String),

    /// Failed to unpack a .deb archive
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Failed to build a .deb archive
    #[error("Archive error: {0}")]
    Archive(String),

    /// Control file does not follow the key/value grammar
    #[error("Malformed control file: {0}")]
    MalformedControl(String),

    /// An existing package record failed to parse. Never auto-repaired:
    /// overwriting it would destroy changelog history.
    #[error("Corrupt package record for '{id}': {reason}")]
    RecordCorrupt { id: String, reason: String },

    /// Failed to persist the catalog index
    #[error("Failed to write catalog index: {0}")]
    IndexWrite(String),

    /// Interactive prompt failed or was exhausted
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using debrepo's Error type
pub type Result<T> = std::result::Result<T, Error>;
