//! Marker classes and the method lookup shared by the dependency and
//! service passes.

use docx_core::errors::DiscoveryError;

use super::{Callable, ErrorFinder, ErrorInstance, Target};
use crate::model::ClassRef;
use crate::query::predicates::{class_matches_any, is_callable_instance};
use crate::resolver::{Object, Resolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Dependency,
    Service,
}

impl MarkerKind {
    pub fn other(self) -> Self {
        match self {
            Self::Dependency => Self::Service,
            Self::Service => Self::Dependency,
        }
    }
}

/// Resolved marker base classes of one kind.
#[derive(Debug, Clone)]
pub struct MarkerSet {
    pub refs: Vec<ClassRef>,
    pub names: Vec<String>,
}

impl MarkerSet {
    pub fn new(resolver: &dyn Resolver, refs: Vec<ClassRef>) -> Self {
        let names = refs.iter().map(|c| resolver.class_def(*c).name.clone()).collect();
        Self { refs, names }
    }

    /// Nominal check: a marker anywhere in the lineage.
    pub fn is_instance(&self, resolver: &dyn Resolver, class: ClassRef) -> bool {
        let lineage = resolver.lineage(class);
        self.refs.iter().any(|marker| lineage.contains(marker))
    }
}

impl ErrorFinder<'_> {
    /// Errors raised by `method` of a resolved dependency or service object.
    ///
    /// `method` is `None` when the provider is a bare name, e.g.
    /// `Depends(Checker)`; a marker class then contributes its `__init__`.
    pub(crate) fn search_method_for_excs(
        &self,
        object: &Object,
        method: Option<&str>,
        kind: MarkerKind,
    ) -> Result<Vec<ErrorInstance>, DiscoveryError> {
        let Some(markers) = self.markers(kind) else {
            return Ok(Vec::new());
        };
        let (class, callable) = match object {
            Object::Instance(class) if markers.is_instance(self.resolver, *class) => {
                let callable = if is_callable_instance(self.resolver, object) {
                    Some("__call__")
                } else {
                    method
                };
                (Some(*class), callable)
            }
            Object::Class(class) if class_matches_any(self.resolver, object, markers.names.as_slice()) => {
                (Some(*class), Some(method.unwrap_or("__init__")))
            }
            Object::Class(class) | Object::Instance(class) => (Some(*class), None),
            _ => (None, None),
        };
        let Some(class) = class else {
            return Ok(Vec::new());
        };

        let mut errors = Vec::new();
        let other = kind.other();
        if let Some(other_markers) = self.markers(other) {
            let subject = if callable.is_some() { Object::Class(class) } else { object.clone() };
            if callable.is_some() || class_matches_any(self.resolver, &subject, other_markers.names.as_slice()) {
                let nested = match other {
                    MarkerKind::Dependency => self.find_dependency_exceptions(Target::Class(class))?,
                    MarkerKind::Service => self.find_service_exceptions(Target::Class(class))?,
                };
                errors.extend(nested);
            }
        }
        if let Some(callable) = callable {
            errors.extend(self.find_exceptions(&Callable::Named(callable.to_string()), Some(class))?);
        }
        Ok(errors)
    }
}
