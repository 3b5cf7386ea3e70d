//! Document generation: discovery over every route, then writing.

use docx_core::config::{ClassRef as ClassPath, ErrorsConfig};
use docx_core::errors::{ConfigError, DiscoveryError, GenerateError};
use serde::Serialize;
use serde_json::Value as Json;

use super::model_schema::model_schema;
use super::schema::http_exception_schema;
use super::writer::{add_model_to_openapi, write_response, CustomErrorDoc};
use crate::discovery::{resolve_class, DiscoveryOptions, ErrorFinder};
use crate::model::Project;
use crate::routes::Route;

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub discovery: DiscoveryOptions,
    pub custom_error_schema: Option<ClassPath>,
    /// Replaces the generic `HTTPExceptionSchema`.
    pub http_error_schema: Option<ClassPath>,
}

impl GenerateOptions {
    pub fn from_config(errors: &ErrorsConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            discovery: DiscoveryOptions {
                custom_error: errors.custom_error_ref()?,
                dependency_classes: errors.dependency_refs()?,
                service_classes: errors.service_refs()?,
            },
            custom_error_schema: errors.custom_error_schema_ref()?,
            http_error_schema: errors.http_error_schema_ref()?,
        })
    }
}

/// Counts from one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerateStats {
    pub routes: usize,
    /// Routes excluded with `include_in_schema=False`.
    pub hidden: usize,
    pub errors: usize,
    pub responses: usize,
}

#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub document: Json,
    pub stats: GenerateStats,
}

/// Augment a copy of `document` with the errors every documented route can
/// raise. Any discovery failure aborts; nothing partial is returned.
pub fn generate(
    document: &Json,
    project: &Project,
    routes: &[Route],
    options: &GenerateOptions,
) -> Result<GenerateReport, GenerateError> {
    let mut document = document.clone();

    let http_schema = match &options.http_error_schema {
        Some(path) => model_schema(project, resolve_class(project, "HTTP error schema", path)?)
            .map_err(DiscoveryError::from)?,
        None => http_exception_schema(),
    };
    add_model_to_openapi(&mut document, &http_schema)?;

    let finder = ErrorFinder::new(project, &options.discovery)?;
    let custom = match (&options.custom_error_schema, finder.custom_error()) {
        (Some(path), Some(class)) => {
            let schema = model_schema(project, resolve_class(project, "custom error schema", path)?)
                .map_err(DiscoveryError::from)?;
            add_model_to_openapi(&mut document, &schema)?;
            Some(CustomErrorDoc {
                class,
                schema: schema.name,
            })
        }
        _ => None,
    };

    let mut stats = GenerateStats::default();
    for route in routes {
        if !route.include_in_schema {
            stats.hidden += 1;
            continue;
        }
        stats.routes += 1;
        let errors = finder.extract_exceptions(route)?;
        stats.errors += errors.len();
        for error in &errors {
            stats.responses += write_response(&mut document, route, error, custom.as_ref(), &http_schema.name)?;
        }
    }
    tracing::info!(
        routes = stats.routes,
        errors = stats.errors,
        responses = stats.responses,
        "document generated"
    );
    Ok(GenerateReport { document, stats })
}
