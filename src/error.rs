// vflow Error Types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VflowError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot scan {}: {reason}", path.display())]
    Scan { path: PathBuf, reason: String },

    #[error("Shoot name '{declared}' does not match the footage dates ({detected}). Use --force to ingest anyway.")]
    ValidationMismatch { declared: String, detected: String },

    #[error("No files matched '{0}'")]
    NoMatch(String),

    #[error("Destination '{label}' unavailable: {reason}")]
    DestinationUnavailable { label: String, reason: String },

    #[error("No destination could accept shoot '{bucket}'; nothing was copied")]
    TotalReconciliationFailure { bucket: String },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("ExifTool error: {0}")]
    ExifTool(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, VflowError>;
