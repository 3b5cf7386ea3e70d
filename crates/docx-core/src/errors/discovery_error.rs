//! Error-discovery engine errors.

use super::error_code::{self, DocxErrorCode};
use super::{EvalError, ParseError};

/// Errors that abort discovery for a route.
///
/// Resolution misses never surface here; they contribute nothing and the
/// engine moves on.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("callable '{name}' given by name without an owning class or module")]
    MissingOwner { name: String },

    #[error("configured {role} class '{path}' does not resolve to a class")]
    UnknownClass { role: String, path: String },

    #[error("failed to evaluate `{expression}`: {source}")]
    Evaluation {
        expression: String,
        #[source]
        source: EvalError,
    },

    #[error("failed to materialize {class}: {source}")]
    Materialize {
        class: String,
        #[source]
        source: EvalError,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

impl DocxErrorCode for DiscoveryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingOwner { .. } => error_code::MISSING_OWNER,
            Self::UnknownClass { .. } => error_code::UNKNOWN_CLASS,
            Self::Evaluation { source, .. } => source.error_code(),
            Self::Materialize { .. } => error_code::MATERIALIZE_ERROR,
            Self::Parse(e) => e.error_code(),
        }
    }
}
