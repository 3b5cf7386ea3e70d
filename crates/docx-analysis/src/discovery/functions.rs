//! Helper discovery: functions a callable refers to by name.

use docx_core::errors::DiscoveryError;

use super::ErrorFinder;
use crate::model::FunctionRef;
use crate::parsers::parse_source;
use crate::query::predicates::is_function_or_coroutine;
use crate::query::{find_nodes, is_name_reference};
use crate::resolver::Object;

impl ErrorFinder<'_> {
    /// Every name in `function` that resolves, through its defining module,
    /// to a function other than `function` itself. One entry per reference.
    pub fn find_functions(&self, function: FunctionRef) -> Result<Vec<FunctionRef>, DiscoveryError> {
        let def = self.resolver.function_def(function);
        let tree = parse_source(&self.resolver.function_source(function), &def.qualname)?;
        let found = find_nodes(tree.root(), "identifier", &[])
            .filter(|node| is_name_reference(*node))
            .filter_map(|node| self.resolver.resolve_in_module(def.module, tree.text(node)))
            .filter(is_function_or_coroutine)
            .filter_map(|object| match object {
                Object::Function(f) if f != function => Some(f),
                _ => None,
            })
            .collect();
        Ok(found)
    }
}
