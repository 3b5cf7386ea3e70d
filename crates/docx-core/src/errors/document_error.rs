//! Interface document errors.

use super::error_code::{self, DocxErrorCode};

/// Errors raised when the interface document has an unexpected shape or
/// cannot be read or written.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document node `{pointer}` is not an object")]
    NotAnObject { pointer: String },

    #[error("failed to read document {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to write document {path}: {message}")]
    Write { path: String, message: String },

    #[error("invalid JSON in {path}: {message}")]
    InvalidJson { path: String, message: String },
}

impl DocxErrorCode for DocumentError {
    fn error_code(&self) -> &'static str {
        error_code::DOCUMENT_ERROR
    }
}
