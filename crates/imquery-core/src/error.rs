//! Error types for imquery operations

use crate::ResultCode;
use thiserror::Error;

/// Result type for imquery operations
pub type ImqResult<T> = Result<T, ImqError>;

/// Errors that can occur while querying, decoding or writing containers
#[derive(Error, Debug)]
pub enum ImqError {
    #[error("Empty path")]
    EmptyPath,

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt header: {0}")]
    CorruptHeader(String),

    #[error("Container holds no pages")]
    NoPages,

    #[error("Page index {index} out of range (container has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Buffer too small: expected {expected}, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },
}

impl ImqError {
    /// Diagnostic code recorded when this error ends an open attempt
    pub fn result_code(&self) -> ResultCode {
        match self {
            ImqError::EmptyPath => ResultCode::EmptyPath,
            ImqError::IoError(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ResultCode::NotFound,
                std::io::ErrorKind::PermissionDenied => ResultCode::PermissionDenied,
                std::io::ErrorKind::UnexpectedEof => ResultCode::CorruptHeader,
                _ => ResultCode::Io,
            },
            ImqError::UnsupportedFormat(_) | ImqError::UnsupportedFeature(_) => {
                ResultCode::UnsupportedFormat
            }
            ImqError::NoPages => ResultCode::NoPages,
            _ => ResultCode::CorruptHeader,
        }
    }
}
