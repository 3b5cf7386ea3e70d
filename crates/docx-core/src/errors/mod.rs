//! Error handling for docx.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod discovery_error;
pub mod document_error;
pub mod error_code;
pub mod eval_error;
pub mod generate_error;
pub mod parse_error;
pub mod project_error;

pub use config_error::ConfigError;
pub use discovery_error::DiscoveryError;
pub use document_error::DocumentError;
pub use error_code::DocxErrorCode;
pub use eval_error::EvalError;
pub use generate_error::GenerateError;
pub use parse_error::ParseError;
pub use project_error::ProjectError;
