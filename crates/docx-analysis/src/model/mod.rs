//! Static project model.
//!
//! Every Python module becomes a symbol table built from its syntax tree.
//! Nothing is imported or executed; the [`crate::resolver`] answers name
//! lookups against these tables.

pub mod builder;
pub mod project;
pub mod scan;
pub mod stubs;

use std::path::PathBuf;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::eval::Value;
use crate::parsers::Range;

pub use project::Project;

/// Index of a module inside a [`Project`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub u32);

/// A function or method: module plus index into [`PyModule::functions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionRef {
    pub module: ModuleId,
    pub index: u32,
}

/// A class: module plus index into [`PyModule::classes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassRef {
    pub module: ModuleId,
    pub index: u32,
}

/// `a.b.c` split into its identifiers.
pub type DottedName = SmallVec<[String; 4]>;

pub fn dotted(parts: &[&str]) -> DottedName {
    parts.iter().map(|p| p.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Import {
    /// `import a.b` binds `a` to module `a`; `import a.b as x` binds `x` to `a.b`.
    Module(String),
    /// `from m import n`, with relative module paths already made absolute.
    Member { module: String, name: String },
}

/// Shape of an expression recorded at build time, for the few places that
/// need more than a literal (call arguments, decorators, router wiring).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Value(Value),
    Name(DottedName),
    Call(Box<CallExpr>),
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: DottedName,
    pub args: Vec<Expr>,
    pub keywords: Vec<(String, Expr)>,
    /// Byte offset of the call in its module source.
    pub start: usize,
}

impl CallExpr {
    pub fn keyword(&self, name: &str) -> Option<&Expr> {
        self.keywords
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
}

impl Expr {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Expr::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// What a name is bound to in a module or class body.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Function(u32),
    Class(u32),
    Import(Import),
    Constant(Value),
    /// `NAME = other.name`
    Alias(DottedName),
    /// `NAME = Callee(...)`
    Call(CallExpr),
    /// `NAME = Annotated[T, Depends(provider)]`
    Annotated { provider: Option<DottedName> },
    Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Positional,
    KeywordOnly,
    VarArgs,
    VarKeywords,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    /// `Some(Value::Unknown)` for a default that is not a literal.
    pub default: Option<Value>,
    pub annotation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub qualname: String,
    pub module: ModuleId,
    pub owner: Option<ClassRef>,
    pub is_async: bool,
    pub decorators: Vec<Expr>,
    pub params: Vec<Param>,
    /// Byte span of the definition in the module source, whole lines,
    /// decorators included.
    pub span: (usize, usize),
}

/// An annotated class-body field, `name: annotation = default`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub annotation: String,
    pub default: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: String,
    pub qualname: String,
    pub module: ModuleId,
    pub parent: Option<ClassRef>,
    pub bases: Vec<DottedName>,
    pub metaclass: Option<DottedName>,
    pub members: FxHashMap<String, Symbol>,
    pub fields: Vec<Field>,
    pub doc: Option<String>,
    pub span: (usize, usize),
}

#[derive(Debug, Clone)]
pub struct PyModule {
    pub name: String,
    pub path: Option<PathBuf>,
    pub is_package: bool,
    pub is_stub: bool,
    pub source: String,
    pub symbols: FxHashMap<String, Symbol>,
    /// Modules named by `from m import *`, in source order.
    pub star_imports: Vec<String>,
    /// Module-level call statements such as `app.include_router(...)`.
    pub calls: Vec<CallExpr>,
    pub functions: Vec<FunctionDef>,
    pub classes: Vec<ClassDef>,
    /// Regions the parser recovered from; definitions inside them are lost.
    pub syntax_errors: Vec<Range>,
}

impl PyModule {
    /// The package relative imports are resolved against.
    pub fn package(&self) -> &str {
        if self.is_package {
            &self.name
        } else {
            self.name.rsplit_once('.').map(|(p, _)| p).unwrap_or("")
        }
    }
}
