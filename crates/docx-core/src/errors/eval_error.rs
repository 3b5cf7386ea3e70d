//! Literal evaluation and constructor interpretation errors.

use super::error_code::{self, DocxErrorCode};

/// Errors raised by the restricted literal evaluator and by static
/// constructor interpretation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// An identifier that is neither a literal binding nor a resolvable constant.
    #[error("name '{name}' is not defined")]
    UnresolvedName { name: String },

    #[error("unsupported expression `{text}` ({kind})")]
    Unsupported { kind: String, text: String },

    #[error("unsupported operand types for {operator}: {left} and {right}")]
    TypeMismatch {
        operator: String,
        left: String,
        right: String,
    },

    #[error("{callable}() missing required argument '{param}'")]
    MissingArgument { callable: String, param: String },

    #[error("{callable}() got an unexpected keyword argument '{keyword}'")]
    UnexpectedKeyword { callable: String, keyword: String },

    #[error("{callable}() got multiple values for argument '{param}'")]
    MultipleValues { callable: String, param: String },

    #[error("{callable}() takes {expected} positional arguments but {given} were given")]
    TooManyArguments {
        callable: String,
        expected: usize,
        given: usize,
    },
}

impl EvalError {
    /// True for the one failure the raise-site fallback recovers from.
    pub fn is_unresolved_name(&self) -> bool {
        matches!(self, Self::UnresolvedName { .. })
    }
}

impl DocxErrorCode for EvalError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnresolvedName { .. } => error_code::UNRESOLVED_NAME,
            Self::Unsupported { .. } | Self::TypeMismatch { .. } => error_code::EVAL_ERROR,
            _ => error_code::CONSTRUCTION_ERROR,
        }
    }
}
