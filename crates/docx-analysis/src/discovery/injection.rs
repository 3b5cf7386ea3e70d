//! Dependency-injection pass: providers named in `Depends(...)`.

use docx_core::errors::DiscoveryError;
use tree_sitter::Node;

use super::{ErrorFinder, ErrorInstance, MarkerKind, Target};
use crate::model::builder::dependency_provider;
use crate::model::ModuleId;
use crate::parsers::{parse_source, SyntaxTree};
use crate::query::{dotted_parts, find_nodes, named_children};
use crate::resolver::Object;

/// A provider expression and the module it resolves in.
struct Provider {
    module: ModuleId,
    parts: Vec<String>,
}

impl ErrorFinder<'_> {
    pub(crate) fn target_source(&self, target: Target) -> Result<(SyntaxTree, ModuleId), DiscoveryError> {
        let (source, origin, module) = match target {
            Target::Function(f) => {
                let def = self.resolver.function_def(f);
                (self.resolver.function_source(f), def.qualname.clone(), def.module)
            }
            Target::Class(c) => {
                let def = self.resolver.class_def(c);
                (self.resolver.class_source(c), def.qualname.clone(), def.module)
            }
        };
        Ok((parse_source(&source, &origin)?, module))
    }

    /// Errors from every injected provider declared by the functions in
    /// `target`: `Depends(...)` defaults and `Annotated[..., Depends(...)]`
    /// annotations, inline or through a module-level alias.
    pub(crate) fn find_dependency_exceptions(&self, target: Target) -> Result<Vec<ErrorInstance>, DiscoveryError> {
        let (tree, module) = self.target_source(target)?;
        let mut errors = Vec::new();
        for function in find_nodes(tree.root(), "function_definition", &[]) {
            let Some(parameters) = function.child_by_field_name("parameters") else {
                continue;
            };
            for parameter in named_children(parameters) {
                for provider in self.parameter_providers(&tree, parameter, module) {
                    errors.extend(self.provider_exceptions(&provider)?);
                }
            }
        }
        Ok(errors)
    }

    fn parameter_providers(&self, tree: &SyntaxTree, parameter: Node<'_>, module: ModuleId) -> Vec<Provider> {
        let mut providers = Vec::new();
        if let Some(default) = parameter.child_by_field_name("value") {
            if default.kind() == "call" {
                if let Some(Some(parts)) = dependency_provider(tree, default) {
                    providers.push(Provider { module, parts });
                }
            }
        }
        let Some(annotation) = parameter.child_by_field_name("type") else {
            return providers;
        };
        let annotation = named_children(annotation).next().unwrap_or(annotation);
        match annotation.kind() {
            "subscript" => {
                let annotated = annotation
                    .child_by_field_name("value")
                    .and_then(|v| dotted_parts(tree, v))
                    .is_some_and(|parts| parts.last().is_some_and(|p| p == "Annotated"));
                if annotated {
                    for call in find_nodes(annotation, "call", &[]) {
                        if let Some(Some(parts)) = dependency_provider(tree, call) {
                            providers.push(Provider { module, parts });
                        }
                    }
                }
            }
            "identifier" | "attribute" => {
                let alias = dotted_parts(tree, annotation).and_then(|parts| self.resolver.resolve_path(module, &parts));
                if let Some(Object::Annotated {
                    module,
                    provider: Some(parts),
                }) = alias
                {
                    providers.push(Provider {
                        module,
                        parts: parts.into_iter().collect(),
                    });
                }
            }
            _ => {}
        }
        providers
    }

    /// `obj.method` resolves `obj` and names the method; a bare name
    /// resolves the provider itself.
    fn provider_exceptions(&self, provider: &Provider) -> Result<Vec<ErrorInstance>, DiscoveryError> {
        let Some((last, init)) = provider.parts.split_last() else {
            return Ok(Vec::new());
        };
        let (object, method) = if init.is_empty() {
            (self.resolver.resolve_in_module(provider.module, last), None)
        } else {
            (self.resolver.resolve_path(provider.module, init), Some(last.as_str()))
        };
        match object {
            Some(object) => self.search_method_for_excs(&object, method, MarkerKind::Dependency),
            None => {
                tracing::trace!(provider = %provider.parts.join("."), "dependency provider not resolved");
                Ok(Vec::new())
            }
        }
    }
}
