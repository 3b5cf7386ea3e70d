//! Owned syntax trees and source positions.

use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Tree};

/// A parsed tree together with the exact source text it was parsed from.
///
/// Nodes borrow from the tree, so every query result lives no longer than
/// this value.
pub struct SyntaxTree {
    tree: Tree,
    source: String,
    syntax_errors: Vec<Range>,
}

impl SyntaxTree {
    pub(crate) fn new(tree: Tree, source: String, syntax_errors: Vec<Range>) -> Self {
        Self {
            tree,
            source,
            syntax_errors,
        }
    }

    /// Where the parser recovered from invalid syntax.
    pub fn syntax_errors(&self) -> &[Range] {
        &self.syntax_errors
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Source text covered by `node`.
    pub fn text(&self, node: Node<'_>) -> &str {
        self.source.get(node.byte_range()).unwrap_or("")
    }
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("root", &self.root().kind())
            .field("len", &self.source.len())
            .field("syntax_errors", &self.syntax_errors.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn from_ts_node(node: &Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start: Position {
                line: start.row as u32,
                column: start.column as u32,
            },
            end: Position {
                line: end.row as u32,
                column: end.column as u32,
            },
        }
    }
}
