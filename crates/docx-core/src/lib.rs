//! docx-core: errors, configuration and tracing shared by the docx crates.
//!
//! - Errors: one `thiserror` enum per subsystem, each with a stable error code
//! - Config: TOML-based, layered resolution (CLI > env > project > user > defaults)
//! - Tracing: `tracing` + `EnvFilter`, controlled by `DOCX_LOG`

pub mod config;
pub mod errors;
pub mod tracing;

pub use config::DocxConfig;
pub use errors::{
    ConfigError, DiscoveryError, DocumentError, DocxErrorCode, EvalError, GenerateError,
    ParseError, ProjectError,
};
