//! Direct raise discovery and error materialization.

use docx_core::errors::DiscoveryError;
use rustc_hash::FxHashMap;
use tree_sitter::Node;

use super::{Callable, ErrorFinder, ErrorInstance};
use crate::eval::{construct, eval_call_arguments, eval_lenient, Arguments, Constructed, EvalScope, Value};
use crate::model::stubs::reason_phrase;
use crate::model::{ClassRef, FunctionRef, ModuleId};
use crate::parsers::{parse_source, SyntaxTree};
use crate::query::predicates::class_matches_any;
use crate::query::{dotted_parts, find_nodes, Slot};
use crate::resolver::Object;

/// How a raised class is instantiated.
enum Materialize {
    /// `raise Outer.Inner()`: nested-class errors are default-constructible.
    ZeroArgs,
    /// `raise Cls(...)`: literal arguments, zero-arg fallback on unresolved names.
    Evaluate,
}

const RAISE_OF_CALL: &[(Slot<'static>, &str)] = &[(Slot::Child(0), "call")];

impl ErrorFinder<'_> {
    /// Materialized errors of every `raise <Call>` in a callable.
    ///
    /// A [`Callable::Named`] is looked up as a method of `owner`; without
    /// an owner it is a precondition violation.
    pub fn find_exceptions(
        &self,
        callable: &Callable,
        owner: Option<ClassRef>,
    ) -> Result<Vec<ErrorInstance>, DiscoveryError> {
        let function = match callable {
            Callable::Function(function) => *function,
            Callable::Named(name) => {
                let owner = owner.ok_or_else(|| DiscoveryError::MissingOwner { name: name.clone() })?;
                match self.resolver.find_method(owner, name) {
                    Some(function) => function,
                    None => {
                        tracing::trace!(
                            class = %self.resolver.class_def(owner).qualname,
                            method = %name,
                            "method not defined"
                        );
                        return Ok(Vec::new());
                    }
                }
            }
        };
        self.function_exceptions(function)
    }

    fn function_exceptions(&self, function: FunctionRef) -> Result<Vec<ErrorInstance>, DiscoveryError> {
        let def = self.resolver.function_def(function);
        let tree = parse_source(&self.resolver.function_source(function), &def.qualname)?;
        let mut errors = Vec::new();
        for raise in find_nodes(tree.root(), "raise_statement", RAISE_OF_CALL) {
            if let Some(error) = self.error_from_raise(&tree, raise, def.module)? {
                errors.push(error);
            }
        }
        Ok(errors)
    }

    fn error_from_raise(
        &self,
        tree: &SyntaxTree,
        raise: Node<'_>,
        module: ModuleId,
    ) -> Result<Option<ErrorInstance>, DiscoveryError> {
        let Some(call) = crate::query::named_children(raise).next() else {
            return Ok(None);
        };
        let Some(function) = call.child_by_field_name("function") else {
            return Ok(None);
        };
        let Some(parts) = dotted_parts(tree, function) else {
            return Ok(None);
        };
        let Some((class, how)) = self.raised_class(module, &parts) else {
            return Ok(None);
        };
        if !class_matches_any(self.resolver, &Object::Class(class), self.error_names.as_slice()) {
            return Ok(None);
        }

        let constructed = match how {
            Materialize::ZeroArgs => self.zero_args(class)?,
            Materialize::Evaluate => {
                let locals = raise_site_locals(self, tree, raise, module);
                let scope = EvalScope::module(self.resolver, module, &locals);
                match eval_call_arguments(tree, call, &scope) {
                    Ok(args) => construct(self.resolver, class, args).map_err(|source| {
                        DiscoveryError::Materialize {
                            class: self.resolver.qualified_name(class),
                            source,
                        }
                    })?,
                    Err(error) if error.is_unresolved_name() => {
                        tracing::trace!(%error, "falling back to zero-argument construction");
                        self.zero_args(class)?
                    }
                    Err(source) => {
                        return Err(DiscoveryError::Evaluation {
                            expression: tree.text(call).to_string(),
                            source,
                        })
                    }
                }
            }
        };
        Ok(self.into_instance(constructed))
    }

    /// Resolve the raised callee. A chain through a class is a nested-class
    /// error; a chain through modules is treated like a bare name.
    fn raised_class(&self, module: ModuleId, parts: &[String]) -> Option<(ClassRef, Materialize)> {
        let (last, init) = parts.split_last()?;
        let (object, how) = if init.is_empty() {
            (self.resolver.resolve_in_module(module, last)?, Materialize::Evaluate)
        } else {
            let outer = self.resolver.resolve_path(module, init)?;
            let how = match outer {
                Object::Module(_) => Materialize::Evaluate,
                _ => Materialize::ZeroArgs,
            };
            (self.resolver.resolve_attribute(&outer, last)?, how)
        };
        match object {
            Object::Class(class) => Some((class, how)),
            _ => None,
        }
    }

    fn zero_args(&self, class: ClassRef) -> Result<Constructed, DiscoveryError> {
        construct(self.resolver, class, Arguments::default()).map_err(|source| DiscoveryError::Materialize {
            class: self.resolver.qualified_name(class),
            source,
        })
    }

    /// Keep exceptions with an integer status code, read from the instance
    /// or, failing that, from the class.
    fn into_instance(&self, constructed: Constructed) -> Option<ErrorInstance> {
        let class = constructed.class;
        let lineage = self.resolver.lineage(class);
        if !self.base_exception.is_some_and(|base| lineage.contains(&base)) {
            return None;
        }
        let def = self.resolver.class_def(class);
        let status = constructed.attr(self.resolver, "status_code");
        let status_code = match status.as_int().and_then(|c| u16::try_from(c).ok()) {
            Some(code) => code,
            None => {
                tracing::debug!(
                    class = %def.qualname,
                    status_code = ?status,
                    "status code did not resolve to an integer, skipping"
                );
                return None;
            }
        };
        let detail = match constructed.attr(self.resolver, "detail") {
            Value::Str(detail) => Some(detail),
            Value::None | Value::Unknown => reason_phrase(status_code).map(str::to_string),
            other => Some(other.py_str()),
        };
        Some(ErrorInstance {
            class_name: def.name.clone(),
            qualname: self.resolver.qualified_name(class),
            lineage: lineage.iter().map(|c| self.resolver.qualified_name(*c)).collect(),
            status_code,
            detail,
        })
    }
}

/// Names bound by assignments before `raise` in the enclosing function.
/// A later assignment that is not literal unbinds the name.
fn raise_site_locals(
    finder: &ErrorFinder<'_>,
    tree: &SyntaxTree,
    raise: Node<'_>,
    module: ModuleId,
) -> FxHashMap<String, Value> {
    let mut locals: FxHashMap<String, Value> = FxHashMap::default();
    for assign in find_nodes(tree.root(), "assignment", &[]) {
        if assign.start_byte() >= raise.start_byte() {
            break;
        }
        let (Some(left), Some(right)) = (assign.child_by_field_name("left"), assign.child_by_field_name("right")) else {
            continue;
        };
        if left.kind() != "identifier" {
            continue;
        }
        let name = tree.text(left).to_string();
        let value = eval_lenient(tree, right, &EvalScope::module(finder.resolver, module, &locals));
        if value.is_unknown() {
            locals.remove(&name);
        } else {
            locals.insert(name, value);
        }
    }
    locals
}
