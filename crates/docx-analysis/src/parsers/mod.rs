//! Tree-sitter parser subsystem: Python only, one thread_local parser instance.

pub mod python;
pub mod source;
pub mod types;

use std::cell::RefCell;

use docx_core::errors::ParseError;

pub use python::PythonParser;
pub use source::dedent;
pub use types::{Range, SyntaxTree};

thread_local! {
    static PARSER: RefCell<Option<PythonParser>> = const { RefCell::new(None) };
}

/// Parse Python source with this thread's parser, creating it on first use.
///
/// `origin` only labels errors.
pub fn parse_source(source: &str, origin: &str) -> Result<SyntaxTree, ParseError> {
    PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(PythonParser::new()?);
        }
        match slot.as_mut() {
            Some(parser) => parser.parse(source, origin),
            None => Err(ParseError::GrammarLoad {
                message: "parser unavailable".to_string(),
            }),
        }
    })
}
