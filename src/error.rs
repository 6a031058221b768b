//! Error types for bhl-ead operations.

use thiserror::Error;

/// Errors that can occur while loading records or exporting a finding aid.
///
/// Errors raised while serializing a single component never reach the caller
/// of the stream; they are folded into an inline diagnostic at that node.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Resource not found: {0}")]
    NotFound(u64),

    #[error("Component {0} could not be resolved")]
    MissingComponent(u32),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, Error>;
