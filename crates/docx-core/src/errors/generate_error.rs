//! Document generation errors.

use super::error_code::DocxErrorCode;
use super::{ConfigError, DiscoveryError, DocumentError, ProjectError};

/// Errors that can occur during document generation.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Project error: {0}")]
    Project(#[from] ProjectError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}

impl DocxErrorCode for GenerateError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Project(e) => e.error_code(),
            Self::Discovery(e) => e.error_code(),
            Self::Document(e) => e.error_code(),
        }
    }
}
