//! Project model errors.

use std::path::PathBuf;

use super::error_code::{self, DocxErrorCode};
use super::ParseError;

/// Errors that can occur while loading a Python project into the model.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("Failed to read {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Failed to walk {root}: {message}")]
    Walk { root: PathBuf, message: String },

    #[error("Module {name} is defined twice")]
    DuplicateModule { name: String },

    #[error("Failed to parse module {module}: {source}")]
    Parse {
        module: String,
        #[source]
        source: ParseError,
    },
}

impl DocxErrorCode for ProjectError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateModule { .. } => error_code::DUPLICATE_MODULE,
            Self::Parse { source, .. } => source.error_code(),
            _ => error_code::PROJECT_ERROR,
        }
    }
}
