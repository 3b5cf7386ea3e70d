//! Error-discovery configuration.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Which error classes count and how they are documented.
///
/// Class references are written `package.module:ClassName`; the dotted form
/// `package.module.ClassName` is accepted too.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ErrorsConfig {
    /// Application error base class, documented with `custom_error_schema`.
    pub custom_error: Option<String>,
    /// Model class describing the custom error payload.
    pub custom_error_schema: Option<String>,
    /// Replacement for the generic `{detail: string}` HTTP error schema.
    pub http_error_schema: Option<String>,
    /// Marker base classes for injected dependency providers.
    #[serde(default)]
    pub dependency_classes: Vec<String>,
    /// Marker base classes for service objects.
    #[serde(default)]
    pub service_classes: Vec<String>,
}

/// A parsed class reference: defining module plus dotted name inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassRef {
    pub module: String,
    pub name: String,
}

impl ClassRef {
    pub fn parse(field: &str, raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        let invalid = |message: &str| ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("{message}: '{raw}'"),
        };
        let (module, name) = match raw.split_once(':') {
            Some((module, name)) => (module, name),
            None => raw
                .rsplit_once('.')
                .ok_or_else(|| invalid("expected module.path:ClassName"))?,
        };
        if module.is_empty() || name.is_empty() {
            return Err(invalid("expected module.path:ClassName"));
        }
        let well_formed = |s: &str| {
            s.split('.').all(|part| {
                !part.is_empty()
                    && part.chars().all(|c| c.is_alphanumeric() || c == '_')
                    && !part.starts_with(|c: char| c.is_ascii_digit())
            })
        };
        if !well_formed(module) || !well_formed(name) {
            return Err(invalid("not a dotted Python identifier"));
        }
        Ok(Self {
            module: module.to_string(),
            name: name.to_string(),
        })
    }

    /// Last component of the class name.
    pub fn class_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

impl std::fmt::Display for ClassRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.module, self.name)
    }
}

impl ErrorsConfig {
    pub fn custom_error_ref(&self) -> Result<Option<ClassRef>, ConfigError> {
        self.custom_error
            .as_deref()
            .map(|raw| ClassRef::parse("errors.custom_error", raw))
            .transpose()
    }

    pub fn custom_error_schema_ref(&self) -> Result<Option<ClassRef>, ConfigError> {
        self.custom_error_schema
            .as_deref()
            .map(|raw| ClassRef::parse("errors.custom_error_schema", raw))
            .transpose()
    }

    pub fn http_error_schema_ref(&self) -> Result<Option<ClassRef>, ConfigError> {
        self.http_error_schema
            .as_deref()
            .map(|raw| ClassRef::parse("errors.http_error_schema", raw))
            .transpose()
    }

    pub fn dependency_refs(&self) -> Result<Vec<ClassRef>, ConfigError> {
        self.dependency_classes
            .iter()
            .map(|raw| ClassRef::parse("errors.dependency_classes", raw))
            .collect()
    }

    pub fn service_refs(&self) -> Result<Vec<ClassRef>, ConfigError> {
        self.service_classes
            .iter()
            .map(|raw| ClassRef::parse("errors.service_classes", raw))
            .collect()
    }
}
