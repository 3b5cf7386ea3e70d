//! Configuration system for docx.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod docx_config;
pub mod errors_config;
pub mod project_config;

pub use docx_config::{CliOverrides, DocxConfig};
pub use errors_config::{ClassRef, ErrorsConfig};
pub use project_config::ProjectConfig;
