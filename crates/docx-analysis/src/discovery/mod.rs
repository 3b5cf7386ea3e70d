//! Error-discovery engine.
//!
//! Walks the static call graph of a route handler (helpers, injected
//! dependency providers, service-object methods) and materializes every
//! `raise <Call>` whose class passes the error-class filter.

mod functions;
mod injection;
mod methods;
mod raises;
mod services;

use std::collections::VecDeque;

use docx_core::config::ClassRef as ClassPath;
use docx_core::errors::DiscoveryError;
use serde::Serialize;

use crate::model::{ClassRef, FunctionRef};
use crate::resolver::{Object, Resolver};
use crate::routes::Route;

pub use methods::{MarkerKind, MarkerSet};

/// Engine configuration, as class paths still to be resolved.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    pub custom_error: Option<ClassPath>,
    pub dependency_classes: Vec<ClassPath>,
    pub service_classes: Vec<ClassPath>,
}

/// A statically materialized error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInstance {
    pub class_name: String,
    /// `module:Qual.Name`
    pub qualname: String,
    /// Qualified names, the class itself first.
    pub lineage: Vec<String>,
    pub status_code: u16,
    pub detail: Option<String>,
}

impl ErrorInstance {
    pub fn is_instance_of(&self, qualname: &str) -> bool {
        self.lineage.iter().any(|c| c == qualname)
    }
}

/// A callable to scan for raises.
#[derive(Debug, Clone, PartialEq)]
pub enum Callable {
    Function(FunctionRef),
    /// A method name, looked up on the owning class.
    Named(String),
}

/// What a dependency or service pass reads the source of.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Target {
    Function(FunctionRef),
    Class(ClassRef),
}

/// The engine. Holds no per-route state; every call builds its own queue
/// and result list.
pub struct ErrorFinder<'r> {
    resolver: &'r dyn Resolver,
    /// Names a raised class (or one of its direct bases) must carry.
    error_names: Vec<String>,
    custom: Option<ClassRef>,
    base_exception: Option<ClassRef>,
    dependencies: Option<MarkerSet>,
    services: Option<MarkerSet>,
}

impl<'r> ErrorFinder<'r> {
    pub fn new(resolver: &'r dyn Resolver, options: &DiscoveryOptions) -> Result<Self, DiscoveryError> {
        let custom = options
            .custom_error
            .as_ref()
            .map(|path| resolve_class(resolver, "custom error", path))
            .transpose()?;
        let mut error_names = vec!["HTTPException".to_string()];
        if let Some(custom) = custom {
            error_names.push(resolver.class_def(custom).name.clone());
        }
        let markers = |role: &str, paths: &[ClassPath]| -> Result<Option<MarkerSet>, DiscoveryError> {
            if paths.is_empty() {
                return Ok(None);
            }
            let refs = paths
                .iter()
                .map(|path| resolve_class(resolver, role, path))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(MarkerSet::new(resolver, refs)))
        };
        let base_exception = resolver
            .module_id("builtins")
            .and_then(|builtins| resolver.resolve_in_module(builtins, "BaseException"))
            .and_then(|object| match object {
                Object::Class(class) => Some(class),
                _ => None,
            });
        Ok(Self {
            resolver,
            error_names,
            custom,
            base_exception,
            dependencies: markers("dependency", &options.dependency_classes)?,
            services: markers("service", &options.service_classes)?,
        })
    }

    pub fn error_names(&self) -> &[String] {
        &self.error_names
    }

    /// Qualified name of the custom error class, when configured.
    pub fn custom_error(&self) -> Option<String> {
        self.custom.map(|c| self.resolver.qualified_name(c))
    }

    /// Every error a route's handler can raise, in discovery order.
    /// Errors reachable along several paths appear once per path.
    pub fn extract_exceptions(&self, route: &Route) -> Result<Vec<ErrorInstance>, DiscoveryError> {
        let endpoint = route.endpoint;
        tracing::debug!(route = %route.name, path = %route.path, "extracting exceptions");
        let mut queue: VecDeque<FunctionRef> = VecDeque::from([endpoint]);
        queue.extend(self.find_functions(endpoint)?);
        let mut errors = Vec::new();
        while let Some(function) = queue.pop_front() {
            tracing::debug!(
                function = %self.resolver.function_def(function).qualname,
                queued = queue.len(),
                "scanning function"
            );
            queue.extend(self.find_functions(function)?);
            errors.extend(self.find_exceptions(&Callable::Function(function), None)?);
        }
        if self.dependencies.is_some() {
            errors.extend(self.find_dependency_exceptions(Target::Function(endpoint))?);
        }
        if self.services.is_some() {
            errors.extend(self.find_service_exceptions(Target::Function(endpoint))?);
        }
        tracing::debug!(route = %route.name, errors = errors.len(), "route done");
        Ok(errors)
    }

    fn markers(&self, kind: MarkerKind) -> Option<&MarkerSet> {
        match kind {
            MarkerKind::Dependency => self.dependencies.as_ref(),
            MarkerKind::Service => self.services.as_ref(),
        }
    }
}

pub(crate) fn resolve_class(resolver: &dyn Resolver, role: &str, path: &ClassPath) -> Result<ClassRef, DiscoveryError> {
    let unknown = || DiscoveryError::UnknownClass {
        role: role.to_string(),
        path: path.to_string(),
    };
    let module = resolver.module_id(&path.module).ok_or_else(unknown)?;
    let parts: Vec<String> = path.name.split('.').map(str::to_string).collect();
    match resolver.resolve_path(module, &parts) {
        Some(Object::Class(class)) => Ok(class),
        _ => Err(unknown()),
    }
}
