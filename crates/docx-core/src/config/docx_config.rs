//! Top-level docx configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ErrorsConfig, ProjectConfig};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`DOCX_*`)
/// 3. Project config (`docx.toml` in project root)
/// 4. User config (`~/.docx/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DocxConfig {
    pub project: ProjectConfig,
    pub errors: ErrorsConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub openapi: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub custom_error: Option<String>,
    pub custom_error_schema: Option<String>,
    pub http_error_schema: Option<String>,
    pub dependency_classes: Vec<String>,
    pub service_classes: Vec<String>,
}

impl DocxConfig {
    /// Load configuration for the project rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 4 (lowest priority): user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(path = %user_config_path.display(), error = %e, "ignoring user config");
                    }
                }
            }
        }

        // Layer 3: project config
        let project_config_path = root.join("docx.toml");
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config);

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &DocxConfig) -> Result<(), ConfigError> {
        let errors = &config.errors;
        errors.custom_error_ref()?;
        errors.custom_error_schema_ref()?;
        errors.http_error_schema_ref()?;
        errors.dependency_refs()?;
        errors.service_refs()?;
        if errors.custom_error_schema.is_some() && errors.custom_error.is_none() {
            return Err(ConfigError::ValidationFailed {
                field: "errors.custom_error_schema".to_string(),
                message: "requires errors.custom_error".to_string(),
            });
        }
        if config
            .project
            .extra_ignore
            .iter()
            .any(|pattern| pattern.trim().is_empty())
        {
            return Err(ConfigError::ValidationFailed {
                field: "project.extra_ignore".to_string(),
                message: "patterns must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the user config path: `~/.docx/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        dirs_path().map(|d| d.join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored.
    fn merge_toml_file(config: &mut DocxConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: DocxConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`, where `other` values override `base` values
    /// only when `other` has a value.
    fn merge(base: &mut DocxConfig, other: &DocxConfig) {
        // Project
        if other.project.root.is_some() {
            base.project.root = other.project.root.clone();
        }
        if other.project.openapi.is_some() {
            base.project.openapi = other.project.openapi.clone();
        }
        if other.project.output.is_some() {
            base.project.output = other.project.output.clone();
        }
        if !other.project.extra_ignore.is_empty() {
            base.project.extra_ignore = other.project.extra_ignore.clone();
        }

        // Errors
        if other.errors.custom_error.is_some() {
            base.errors.custom_error = other.errors.custom_error.clone();
        }
        if other.errors.custom_error_schema.is_some() {
            base.errors.custom_error_schema = other.errors.custom_error_schema.clone();
        }
        if other.errors.http_error_schema.is_some() {
            base.errors.http_error_schema = other.errors.http_error_schema.clone();
        }
        if !other.errors.dependency_classes.is_empty() {
            base.errors.dependency_classes = other.errors.dependency_classes.clone();
        }
        if !other.errors.service_classes.is_empty() {
            base.errors.service_classes = other.errors.service_classes.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `DOCX_OPENAPI`, `DOCX_CUSTOM_ERROR`, `DOCX_SERVICE_CLASSES`, etc.
    /// List values are comma-separated.
    fn apply_env_overrides(config: &mut DocxConfig) {
        if let Ok(val) = std::env::var("DOCX_ROOT") {
            config.project.root = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("DOCX_OPENAPI") {
            config.project.openapi = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("DOCX_OUTPUT") {
            config.project.output = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("DOCX_CUSTOM_ERROR") {
            config.errors.custom_error = Some(val);
        }
        if let Ok(val) = std::env::var("DOCX_CUSTOM_ERROR_SCHEMA") {
            config.errors.custom_error_schema = Some(val);
        }
        if let Ok(val) = std::env::var("DOCX_HTTP_ERROR_SCHEMA") {
            config.errors.http_error_schema = Some(val);
        }
        if let Ok(val) = std::env::var("DOCX_DEPENDENCY_CLASSES") {
            config.errors.dependency_classes = split_list(&val);
        }
        if let Ok(val) = std::env::var("DOCX_SERVICE_CLASSES") {
            config.errors.service_classes = split_list(&val);
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut DocxConfig, cli: &CliOverrides) {
        if let Some(ref v) = cli.openapi {
            config.project.openapi = Some(v.clone());
        }
        if let Some(ref v) = cli.output {
            config.project.output = Some(v.clone());
        }
        if let Some(ref v) = cli.custom_error {
            config.errors.custom_error = Some(v.clone());
        }
        if let Some(ref v) = cli.custom_error_schema {
            config.errors.custom_error_schema = Some(v.clone());
        }
        if let Some(ref v) = cli.http_error_schema {
            config.errors.http_error_schema = Some(v.clone());
        }
        if !cli.dependency_classes.is_empty() {
            config.errors.dependency_classes = cli.dependency_classes.clone();
        }
        if !cli.service_classes.is_empty() {
            config.errors.service_classes = cli.service_classes.clone();
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns the user-level docx config directory: `~/.docx/`.
fn dirs_path() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".docx"))
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
