//! Python parser using native tree-sitter.

use docx_core::errors::ParseError;
use tree_sitter::{Node, Parser};

use super::types::{Range, SyntaxTree};

/// Python parser.
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::LANGUAGE;
        parser
            .set_language(&language.into())
            .map_err(|e| ParseError::GrammarLoad {
                message: e.to_string(),
            })?;
        Ok(Self { parser })
    }

    /// Parse Python source into an owned syntax tree.
    ///
    /// Syntax errors do not fail the parse; their ranges are kept on the
    /// tree and the surrounding code is still analysed.
    pub fn parse(&mut self, source: &str, origin: &str) -> Result<SyntaxTree, ParseError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ParseError::TreeSitterError {
                origin: origin.to_string(),
                message: "parser returned no tree".to_string(),
            })?;

        let mut syntax_errors = Vec::new();
        collect_syntax_errors(tree.root_node(), &mut syntax_errors);
        if !syntax_errors.is_empty() {
            tracing::trace!(origin, count = syntax_errors.len(), "parsed with syntax errors");
        }
        Ok(SyntaxTree::new(tree, source.to_string(), syntax_errors))
    }
}

/// ERROR and MISSING nodes, outermost first. Subtrees without errors are
/// skipped.
fn collect_syntax_errors(node: Node<'_>, out: &mut Vec<Range>) {
    if node.is_error() || node.is_missing() {
        out.push(Range::from_ts_node(&node));
    }
    if !node.has_error() {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_syntax_errors(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_source_has_no_syntax_errors() {
        let mut parser = PythonParser::new().unwrap();
        let tree = parser.parse("def ok():\n    return 1\n", "<test>").unwrap();
        assert!(tree.syntax_errors().is_empty());
    }

    #[test]
    fn syntax_errors_are_located() {
        let mut parser = PythonParser::new().unwrap();
        let tree = parser
            .parse("def ok():\n    return 1\n\ndef (:\n    pass\n", "<test>")
            .unwrap();
        let first = tree.syntax_errors().first().copied().unwrap();
        assert_eq!(first.start.line, 3);
        // The valid definition before the error still parses.
        assert!(crate::query::find_nodes(tree.root(), "function_definition", &[])
            .any(|f| f.child_by_field_name("name").is_some_and(|n| tree.text(n) == "ok")));
    }
}
