//! Service pass: methods called on service objects.

use docx_core::errors::DiscoveryError;
use tree_sitter::Node;

use super::{ErrorFinder, ErrorInstance, MarkerKind, Target};
use crate::model::ModuleId;
use crate::parsers::SyntaxTree;
use crate::query::{dotted_parts, find_nodes, Slot};
use crate::resolver::Object;

const ATTRIBUTE_CALL: &[(Slot<'static>, &str)] = &[(Slot::Field("function"), "attribute")];

impl ErrorFinder<'_> {
    /// Errors from every `receiver.method(...)` call in `target`.
    pub(crate) fn find_service_exceptions(&self, target: Target) -> Result<Vec<ErrorInstance>, DiscoveryError> {
        let (tree, module) = self.target_source(target)?;
        let mut errors = Vec::new();
        for call in find_nodes(tree.root(), "call", ATTRIBUTE_CALL) {
            let Some(function) = call.child_by_field_name("function") else {
                continue;
            };
            let (Some(receiver), Some(method)) = (
                function.child_by_field_name("object"),
                function.child_by_field_name("attribute"),
            ) else {
                continue;
            };
            let Some(object) = self.receiver_object(&tree, receiver, module) else {
                continue;
            };
            errors.extend(self.search_method_for_excs(&object, Some(tree.text(method)), MarkerKind::Service)?);
        }
        Ok(errors)
    }

    /// `Cls(...)` resolves `Cls`; a name resolves in the module, or else
    /// through the first `name = Ctor(...)` in the tree whose `Ctor` resolves.
    fn receiver_object(&self, tree: &SyntaxTree, receiver: Node<'_>, module: ModuleId) -> Option<Object> {
        match receiver.kind() {
            "call" => {
                let callee = dotted_parts(tree, receiver.child_by_field_name("function")?)?;
                self.resolver.resolve_path(module, &callee)
            }
            "identifier" => {
                let name = tree.text(receiver);
                self.resolver
                    .resolve_in_module(module, name)
                    .or_else(|| self.local_constructor(tree, name, module))
            }
            _ => None,
        }
    }

    fn local_constructor(&self, tree: &SyntaxTree, name: &str, module: ModuleId) -> Option<Object> {
        find_nodes(tree.root(), "assignment", &[]).find_map(|assign| {
            let left = assign.child_by_field_name("left")?;
            if left.kind() != "identifier" || tree.text(left) != name {
                return None;
            }
            let right = assign.child_by_field_name("right")?;
            if right.kind() != "call" {
                return None;
            }
            let callee = dotted_parts(tree, right.child_by_field_name("function")?)?;
            self.resolver.resolve_path(module, &callee)
        })
    }
}
