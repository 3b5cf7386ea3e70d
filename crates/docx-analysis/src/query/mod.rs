//! Syntax-tree query layer.
//!
//! Stateless helpers over tree-sitter-python trees: lazy kind-filtered
//! traversal, name-reference classification, and small node accessors.

pub mod predicates;

use tree_sitter::{Node, TreeCursor};

use crate::parsers::SyntaxTree;

/// Where a filter looks for a sub-node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'a> {
    /// A named field, e.g. `function` on a `call`.
    Field(&'a str),
    /// The n-th named child, comments excluded. Used for unfielded
    /// children such as the raised expression of a `raise_statement`.
    Child(usize),
}

/// Lazy pre-order iterator over the nodes of one kind.
///
/// Created by [`find_nodes`]. Exhausts once; there is no reset.
pub struct FindNodes<'t, 'q> {
    cursor: TreeCursor<'t>,
    done: bool,
    kind: &'q str,
    filter: &'q [(Slot<'q>, &'q str)],
}

/// Yield every node of `kind` under (and including) `root`, in pre-order.
///
/// With a non-empty `filter`, a node qualifies only when every slot exists
/// and holds a node of the required kind.
pub fn find_nodes<'t, 'q>(
    root: Node<'t>,
    kind: &'q str,
    filter: &'q [(Slot<'q>, &'q str)],
) -> FindNodes<'t, 'q> {
    FindNodes {
        cursor: root.walk(),
        done: false,
        kind,
        filter,
    }
}

impl<'t> FindNodes<'t, '_> {
    fn advance(&mut self) {
        if self.cursor.goto_first_child() {
            return;
        }
        loop {
            if self.cursor.goto_next_sibling() {
                return;
            }
            if !self.cursor.goto_parent() {
                self.done = true;
                return;
            }
        }
    }
}

impl<'t> Iterator for FindNodes<'t, '_> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Node<'t>> {
        while !self.done {
            let node = self.cursor.node();
            self.advance();
            if node.kind() == self.kind && matches_filter(node, self.filter) {
                return Some(node);
            }
        }
        None
    }
}

fn matches_filter(node: Node<'_>, filter: &[(Slot<'_>, &str)]) -> bool {
    filter
        .iter()
        .all(|(slot, kind)| slot_node(node, *slot).is_some_and(|n| n.kind() == *kind))
}

/// Resolve a slot on `node`.
pub fn slot_node<'t>(node: Node<'t>, slot: Slot<'_>) -> Option<Node<'t>> {
    match slot {
        Slot::Field(name) => node.child_by_field_name(name),
        Slot::Child(index) => named_children(node).nth(index),
    }
}

/// Named children of `node`, comments skipped.
pub fn named_children<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    (0..node.named_child_count())
        .filter_map(move |i| node.named_child(i))
        .filter(|child| child.kind() != "comment")
}

fn is_field_of(node: Node<'_>, parent: Node<'_>, field: &str) -> bool {
    parent
        .child_by_field_name(field)
        .is_some_and(|n| n.id() == node.id())
}

/// True for identifiers Python represents as a `Name`: variable reads and
/// writes, annotation names, decorator names.
///
/// Excludes attribute names, def and class names, parameter names,
/// keyword-argument names and anything inside an import.
pub fn is_name_reference(node: Node<'_>) -> bool {
    if node.kind() != "identifier" {
        return false;
    }
    let Some(parent) = node.parent() else {
        return true;
    };
    match parent.kind() {
        "attribute" => !is_field_of(node, parent, "attribute"),
        "function_definition" | "class_definition" => !is_field_of(node, parent, "name"),
        "keyword_argument" => !is_field_of(node, parent, "name"),
        "default_parameter" | "typed_default_parameter" => !is_field_of(node, parent, "name"),
        "parameters" | "lambda_parameters" | "typed_parameter" => false,
        "list_splat_pattern" | "dictionary_splat_pattern" => !in_parameter_list(parent),
        "dotted_name" | "aliased_import" | "import_prefix" | "relative_import" => false,
        "global_statement" | "nonlocal_statement" => false,
        _ => true,
    }
}

fn in_parameter_list(node: Node<'_>) -> bool {
    node.parent().is_some_and(|p| {
        matches!(
            p.kind(),
            "parameters" | "lambda_parameters" | "typed_parameter" | "typed_default_parameter"
        )
    })
}

/// Flatten an `identifier` or `attribute` chain of identifiers into its
/// parts, e.g. `a.b.c` -> `["a", "b", "c"]`. Anything else yields `None`.
pub fn dotted_parts(tree: &SyntaxTree, node: Node<'_>) -> Option<Vec<String>> {
    match node.kind() {
        "identifier" => Some(vec![tree.text(node).to_string()]),
        "attribute" => {
            let object = node.child_by_field_name("object")?;
            let attribute = node.child_by_field_name("attribute")?;
            let mut parts = dotted_parts(tree, object)?;
            parts.push(tree.text(attribute).to_string());
            Some(parts)
        }
        "parenthesized_expression" => dotted_parts(tree, named_children(node).next()?),
        _ => None,
    }
}

/// Positional and keyword arguments of a `call`, in source order.
/// Splats are returned as positional nodes of their own kind.
pub fn call_arguments<'t>(call: Node<'t>) -> (Vec<Node<'t>>, Vec<(Node<'t>, Node<'t>)>) {
    let mut positional = Vec::new();
    let mut keywords = Vec::new();
    let Some(args) = call.child_by_field_name("arguments") else {
        return (positional, keywords);
    };
    if args.kind() != "argument_list" {
        // `f(x for x in y)`
        positional.push(args);
        return (positional, keywords);
    }
    for arg in named_children(args) {
        if arg.kind() == "keyword_argument" {
            if let (Some(name), Some(value)) = (
                arg.child_by_field_name("name"),
                arg.child_by_field_name("value"),
            ) {
                keywords.push((name, value));
            }
        } else {
            positional.push(arg);
        }
    }
    (positional, keywords)
}

/// True when a `function_definition` starts with the `async` keyword.
pub fn is_async_def(node: Node<'_>) -> bool {
    node.child(0).is_some_and(|c| c.kind() == "async")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::parse_source;

    #[test]
    fn find_nodes_is_preorder_and_filtered() {
        let tree = parse_source(
            "def f():\n    raise A()\n    raise b\n    if x:\n        raise C(1)\n",
            "<test>",
        )
        .unwrap();
        let filter = [(Slot::Child(0), "call")];
        let raised: Vec<_> = find_nodes(tree.root(), "raise_statement", &filter)
            .map(|n| tree.text(n).to_string())
            .collect();
        assert_eq!(raised, vec!["raise A()", "raise C(1)"]);

        let all = find_nodes(tree.root(), "raise_statement", &[]).count();
        assert_eq!(all, 3);
    }

    #[test]
    fn find_nodes_includes_root() {
        let tree = parse_source("x = 1\n", "<test>").unwrap();
        assert_eq!(find_nodes(tree.root(), "module", &[]).count(), 1);
    }

    #[test]
    fn name_references_skip_definitions_and_attributes() {
        let tree = parse_source(
            "from m import helper\n\
             def f(a, b=helper, *rest, key: Kind = None, **kw):\n    \
             obj.attr(value=other)\n    return helper(a)\n",
            "<test>",
        )
        .unwrap();
        let names: Vec<_> = find_nodes(tree.root(), "identifier", &[])
            .filter(|n| is_name_reference(*n))
            .map(|n| tree.text(n).to_string())
            .collect();
        assert_eq!(names, vec!["helper", "Kind", "obj", "other", "helper", "a"]);
    }

    #[test]
    fn dotted_parts_flattens_chains() {
        let tree = parse_source("a.b.c\nf().g\n", "<test>").unwrap();
        let attrs: Vec<_> = find_nodes(tree.root(), "expression_statement", &[])
            .filter_map(|s| named_children(s).next())
            .map(|n| dotted_parts(&tree, n))
            .collect();
        assert_eq!(
            attrs,
            vec![
                Some(vec!["a".to_string(), "b".to_string(), "c".to_string()]),
                None
            ]
        );
    }
}
