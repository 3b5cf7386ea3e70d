//! Parser errors.

use super::error_code::{self, DocxErrorCode};

/// Errors that can occur while parsing Python source.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to load the Python grammar: {message}")]
    GrammarLoad { message: String },

    #[error("Tree-sitter error parsing {origin}: {message}")]
    TreeSitterError { origin: String, message: String },
}

impl DocxErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::GrammarLoad { .. } => error_code::GRAMMAR_ERROR,
            Self::TreeSitterError { .. } => error_code::PARSE_ERROR,
        }
    }
}
