//! Error types for Splice.

use thiserror::Error;

/// Main error type for Splice operations.
#[derive(Error, Debug)]
pub enum SpliceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Could not open playback device {device}: {reason}")]
    DeviceOpen { device: String, reason: String },

    #[error("Failed to negotiate {parameter}: {reason}")]
    Negotiation { parameter: String, reason: String },

    #[error("Device error: {0}")]
    Device(String),

    #[error("Source contract violation: {0}")]
    SourceContract(String),

    #[error("This handle doesn't refer to a valid item anymore")]
    StaleHandle,

    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Splice operations.
pub type Result<T> = std::result::Result<T, SpliceError>;
