//! Builds a [`PyModule`] symbol table from one parsed source file.

use std::path::PathBuf;

use docx_core::errors::ParseError;
use rustc_hash::FxHashMap;
use tree_sitter::Node;

use super::{
    CallExpr, ClassDef, DottedName, Expr, Field, FunctionDef, Import, ModuleId, Param, ParamKind,
    PyModule, Symbol,
};
use crate::eval::{eval_lenient, EvalScope, Value};
use crate::parsers::{parse_source, source::line_span, SyntaxTree};
use crate::query::{call_arguments, dotted_parts, find_nodes, is_async_def, named_children};

/// Input for one module.
pub struct ModuleSource {
    pub name: String,
    pub path: Option<PathBuf>,
    pub is_package: bool,
    pub is_stub: bool,
    pub source: String,
}

/// Parse `input` and build its symbol table. Functions and classes record
/// `id` as their module.
pub fn build_module(id: ModuleId, input: ModuleSource) -> Result<PyModule, ParseError> {
    let tree = parse_source(&input.source, &input.name)?;
    let mut module = PyModule {
        name: input.name,
        path: input.path,
        is_package: input.is_package,
        is_stub: input.is_stub,
        source: String::new(),
        symbols: FxHashMap::default(),
        star_imports: Vec::new(),
        calls: Vec::new(),
        functions: Vec::new(),
        classes: Vec::new(),
        syntax_errors: tree.syntax_errors().to_vec(),
    };
    let mut builder = ModuleBuilder {
        tree: &tree,
        id,
        module: &mut module,
        constants: FxHashMap::default(),
    };
    builder.visit_block(tree.root(), None);
    module.source = input.source;
    Ok(module)
}

struct ModuleBuilder<'a> {
    tree: &'a SyntaxTree,
    id: ModuleId,
    module: &'a mut PyModule,
    /// Literal constants bound so far, per scope (`None` = module body).
    constants: FxHashMap<Option<u32>, FxHashMap<String, Value>>,
}

impl<'a> ModuleBuilder<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        self.tree.text(node)
    }

    fn bind(&mut self, scope: Option<u32>, name: &str, symbol: Symbol) {
        let env = self.constants.entry(scope).or_default();
        match &symbol {
            Symbol::Constant(value) => {
                env.insert(name.to_string(), value.clone());
            }
            _ => {
                env.remove(name);
            }
        }
        let table = match scope {
            Some(class) => &mut self.module.classes[class as usize].members,
            None => &mut self.module.symbols,
        };
        table.insert(name.to_string(), symbol);
    }

    fn literal(&self, scope: Option<u32>, node: Node<'_>) -> Value {
        let empty = FxHashMap::default();
        let env = self.constants.get(&scope).unwrap_or(&empty);
        eval_lenient(self.tree, node, &EvalScope::literal(env))
    }

    fn visit_block(&mut self, block: Node<'_>, scope: Option<u32>) {
        for stmt in named_children(block) {
            match stmt.kind() {
                "import_statement" => self.visit_import(stmt, scope),
                "import_from_statement" => self.visit_import_from(stmt, scope),
                "function_definition" => self.add_function(stmt, Vec::new(), stmt.start_byte(), scope),
                "class_definition" => self.add_class(stmt, Vec::new(), stmt.start_byte(), scope),
                "decorated_definition" => self.visit_decorated(stmt, scope),
                "expression_statement" => self.visit_expression_statement(stmt, scope),
                "if_statement" | "try_statement" | "with_statement" => {
                    for nested in nested_blocks(stmt) {
                        self.visit_block(nested, scope);
                    }
                }
                _ => {}
            }
        }
    }

    fn visit_decorated(&mut self, node: Node<'_>, scope: Option<u32>) {
        let decorators: Vec<Expr> = named_children(node)
            .filter(|c| c.kind() == "decorator")
            .filter_map(|d| named_children(d).next())
            .map(|e| self.to_expr(e, scope))
            .collect();
        let Some(definition) = node.child_by_field_name("definition") else {
            return;
        };
        match definition.kind() {
            "function_definition" => {
                self.add_function(definition, decorators, node.start_byte(), scope)
            }
            "class_definition" => self.add_class(definition, decorators, node.start_byte(), scope),
            _ => {}
        }
    }

    fn visit_import(&mut self, node: Node<'_>, scope: Option<u32>) {
        let mut cursor = node.walk();
        let names: Vec<Node<'_>> = node.children_by_field_name("name", &mut cursor).collect();
        for name in names {
            match name.kind() {
                "dotted_name" => {
                    let full = self.text(name);
                    let first = full.split('.').next().unwrap_or(full).trim();
                    self.bind(scope, first, Symbol::Import(Import::Module(first.to_string())));
                }
                "aliased_import" => {
                    let (Some(target), Some(alias)) = (
                        name.child_by_field_name("name"),
                        name.child_by_field_name("alias"),
                    ) else {
                        continue;
                    };
                    let target = normalize_dotted(self.text(target));
                    let alias = self.text(alias);
                    self.bind(scope, alias, Symbol::Import(Import::Module(target)));
                }
                _ => {}
            }
        }
    }

    fn visit_import_from(&mut self, node: Node<'_>, scope: Option<u32>) {
        let Some(module_node) = node.child_by_field_name("module_name") else {
            return;
        };
        let Some(module) = self.absolute_module(module_node) else {
            tracing::debug!(module = %self.module.name, "relative import escapes the project root");
            return;
        };
        if named_children(node).any(|c| c.kind() == "wildcard_import") {
            self.module.star_imports.push(module);
            return;
        }
        let mut cursor = node.walk();
        let names: Vec<Node<'_>> = node.children_by_field_name("name", &mut cursor).collect();
        for name in names {
            let (target, bound) = match name.kind() {
                "dotted_name" => (self.text(name), self.text(name)),
                "aliased_import" => {
                    let (Some(target), Some(alias)) = (
                        name.child_by_field_name("name"),
                        name.child_by_field_name("alias"),
                    ) else {
                        continue;
                    };
                    (self.text(target), self.text(alias))
                }
                _ => continue,
            };
            self.bind(
                scope,
                bound.trim(),
                Symbol::Import(Import::Member {
                    module: module.clone(),
                    name: normalize_dotted(target),
                }),
            );
        }
    }

    /// `a.b`, `.b`, `..` made absolute against this module's package.
    fn absolute_module(&self, node: Node<'_>) -> Option<String> {
        if node.kind() != "relative_import" {
            return Some(normalize_dotted(self.text(node)));
        }
        let mut level = 0usize;
        let mut tail = None;
        for child in named_children(node) {
            match child.kind() {
                "import_prefix" => level = self.text(child).trim().len(),
                "dotted_name" => tail = Some(normalize_dotted(self.text(child))),
                _ => {}
            }
        }
        let mut base: Vec<&str> = self
            .module
            .package()
            .split('.')
            .filter(|p| !p.is_empty())
            .collect();
        for _ in 1..level {
            base.pop()?;
        }
        let mut parts: Vec<String> = base.into_iter().map(str::to_string).collect();
        if let Some(tail) = tail {
            parts.push(tail);
        }
        if parts.is_empty() {
            return None;
        }
        Some(parts.join("."))
    }

    fn visit_expression_statement(&mut self, stmt: Node<'_>, scope: Option<u32>) {
        let Some(inner) = named_children(stmt).next() else {
            return;
        };
        match inner.kind() {
            "assignment" => self.visit_assignment(inner, scope),
            "augmented_assignment" => {
                if let Some(left) = inner.child_by_field_name("left") {
                    if left.kind() == "identifier" {
                        self.bind(scope, self.text(left), Symbol::Opaque);
                    }
                }
            }
            "call" if scope.is_none() => {
                if let Some(call) = self.call_expr(inner, scope) {
                    self.module.calls.push(call);
                }
            }
            _ => {}
        }
    }

    fn visit_assignment(&mut self, assign: Node<'_>, scope: Option<u32>) {
        let Some(left) = assign.child_by_field_name("left") else {
            return;
        };
        let mut right = assign.child_by_field_name("right");
        // `a = b = value`: bind every target to the final value.
        let mut targets = vec![left];
        while let Some(r) = right.filter(|r| r.kind() == "assignment") {
            if let Some(l) = r.child_by_field_name("left") {
                targets.push(l);
            }
            right = r.child_by_field_name("right");
        }

        if let (Some(class), Some(annotation)) = (scope, assign.child_by_field_name("type")) {
            if left.kind() == "identifier" {
                let default = right.map(|r| self.literal(scope, r));
                let field = Field {
                    name: self.text(left).to_string(),
                    annotation: self.text(annotation).to_string(),
                    default,
                };
                self.module.classes[class as usize].fields.push(field);
            }
        }

        let Some(right) = right else {
            return;
        };
        let symbol = self.classify(right, scope);
        for target in targets {
            match target.kind() {
                "identifier" => self.bind(scope, self.text(target), symbol.clone()),
                "pattern_list" | "tuple_pattern" | "list_pattern" => {
                    for name in find_nodes(target, "identifier", &[]) {
                        self.bind(scope, self.text(name), Symbol::Opaque);
                    }
                }
                _ => {}
            }
        }
    }

    /// Decide what a right-hand side binds a name to.
    fn classify(&self, node: Node<'_>, scope: Option<u32>) -> Symbol {
        match node.kind() {
            "identifier" | "attribute" => match dotted_parts(self.tree, node) {
                Some(parts) => Symbol::Alias(parts.into_iter().collect()),
                None => Symbol::Opaque,
            },
            "call" => match self.call_expr(node, scope) {
                Some(call) => Symbol::Call(call),
                None => Symbol::Opaque,
            },
            "subscript" if self.is_annotated(node) => Symbol::Annotated {
                provider: self.annotated_provider(node),
            },
            _ => match self.literal(scope, node) {
                Value::Unknown => Symbol::Opaque,
                value => Symbol::Constant(value),
            },
        }
    }

    fn is_annotated(&self, subscript: Node<'_>) -> bool {
        subscript
            .child_by_field_name("value")
            .and_then(|v| dotted_parts(self.tree, v))
            .is_some_and(|parts| parts.last().is_some_and(|p| p == "Annotated"))
    }

    /// The provider of the first `Depends(...)` inside an `Annotated[...]`.
    fn annotated_provider(&self, subscript: Node<'_>) -> Option<DottedName> {
        find_nodes(subscript, "call", &[])
            .find_map(|call| dependency_provider(self.tree, call))
            .flatten()
            .map(|parts| parts.into_iter().collect())
    }

    fn call_expr(&self, call: Node<'_>, scope: Option<u32>) -> Option<CallExpr> {
        let callee = dotted_parts(self.tree, call.child_by_field_name("function")?)?;
        let (positional, keywords) = call_arguments(call);
        Some(CallExpr {
            callee: callee.into_iter().collect(),
            args: positional.into_iter().map(|a| self.to_expr(a, scope)).collect(),
            keywords: keywords
                .into_iter()
                .map(|(k, v)| (self.text(k).to_string(), self.to_expr(v, scope)))
                .collect(),
            start: call.start_byte(),
        })
    }

    fn to_expr(&self, node: Node<'_>, scope: Option<u32>) -> Expr {
        match node.kind() {
            "identifier" | "attribute" => match dotted_parts(self.tree, node) {
                Some(parts) => Expr::Name(parts.into_iter().collect()),
                None => Expr::Other,
            },
            "call" => match self.call_expr(node, scope) {
                Some(call) => Expr::Call(Box::new(call)),
                None => Expr::Other,
            },
            _ => match self.literal(scope, node) {
                Value::Unknown => Expr::Other,
                value => Expr::Value(value),
            },
        }
    }

    fn qualname(&self, scope: Option<u32>, name: &str) -> String {
        match scope {
            Some(class) => format!("{}.{}", self.module.classes[class as usize].qualname, name),
            None => name.to_string(),
        }
    }

    fn add_function(
        &mut self,
        node: Node<'_>,
        decorators: Vec<Expr>,
        start: usize,
        scope: Option<u32>,
    ) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.text(name_node);
        let params = node
            .child_by_field_name("parameters")
            .map(|p| self.params(p, scope))
            .unwrap_or_default();
        let def = FunctionDef {
            name: name.to_string(),
            qualname: self.qualname(scope, name),
            module: self.id,
            owner: scope.map(|index| super::ClassRef {
                module: self.id,
                index,
            }),
            is_async: is_async_def(node),
            decorators,
            params,
            span: line_span(self.tree.source(), start, node.end_byte()),
        };
        let index = self.module.functions.len() as u32;
        self.module.functions.push(def);
        self.bind(scope, name, Symbol::Function(index));
    }

    fn params(&self, params: Node<'_>, scope: Option<u32>) -> Vec<Param> {
        let mut out = Vec::new();
        let mut keyword_only = false;
        let positional = |keyword_only: bool| {
            if keyword_only {
                ParamKind::KeywordOnly
            } else {
                ParamKind::Positional
            }
        };
        for p in named_children(params) {
            let param = match p.kind() {
                "identifier" => Param {
                    name: self.text(p).to_string(),
                    kind: positional(keyword_only),
                    default: None,
                    annotation: None,
                },
                "default_parameter" | "typed_default_parameter" => {
                    let Some(name) = p.child_by_field_name("name") else {
                        continue;
                    };
                    Param {
                        name: self.text(name).to_string(),
                        kind: positional(keyword_only),
                        default: p.child_by_field_name("value").map(|v| self.literal(scope, v)),
                        annotation: p
                            .child_by_field_name("type")
                            .map(|t| self.text(t).to_string()),
                    }
                }
                "typed_parameter" => {
                    let annotation = p.child_by_field_name("type").map(|t| self.text(t).to_string());
                    let Some(inner) = named_children(p).next() else {
                        continue;
                    };
                    let (name, kind) = match inner.kind() {
                        "list_splat_pattern" => {
                            keyword_only = true;
                            (splat_name(self.tree, inner), ParamKind::VarArgs)
                        }
                        "dictionary_splat_pattern" => {
                            (splat_name(self.tree, inner), ParamKind::VarKeywords)
                        }
                        _ => (self.text(inner).to_string(), positional(keyword_only)),
                    };
                    Param {
                        name,
                        kind,
                        default: None,
                        annotation,
                    }
                }
                "list_splat_pattern" => {
                    keyword_only = true;
                    Param {
                        name: splat_name(self.tree, p),
                        kind: ParamKind::VarArgs,
                        default: None,
                        annotation: None,
                    }
                }
                "dictionary_splat_pattern" => Param {
                    name: splat_name(self.tree, p),
                    kind: ParamKind::VarKeywords,
                    default: None,
                    annotation: None,
                },
                "keyword_separator" => {
                    keyword_only = true;
                    continue;
                }
                _ => continue,
            };
            out.push(param);
        }
        out
    }

    fn add_class(&mut self, node: Node<'_>, _decorators: Vec<Expr>, start: usize, scope: Option<u32>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.text(name_node);
        let mut bases = Vec::new();
        let mut metaclass = None;
        if let Some(args) = node.child_by_field_name("superclasses") {
            let (positional, keywords) = arguments_of(args);
            for base in positional {
                if let Some(parts) = dotted_parts(self.tree, base) {
                    bases.push(parts.into_iter().collect());
                }
            }
            for (key, value) in keywords {
                if self.text(key) == "metaclass" {
                    metaclass = dotted_parts(self.tree, value).map(|p| p.into_iter().collect());
                }
            }
        }
        let body = node.child_by_field_name("body");
        let doc = body.and_then(|b| self.docstring(b));
        let def = ClassDef {
            name: name.to_string(),
            qualname: self.qualname(scope, name),
            module: self.id,
            parent: scope.map(|index| super::ClassRef {
                module: self.id,
                index,
            }),
            bases,
            metaclass,
            members: FxHashMap::default(),
            fields: Vec::new(),
            doc,
            span: line_span(self.tree.source(), start, node.end_byte()),
        };
        let index = self.module.classes.len() as u32;
        self.module.classes.push(def);
        self.bind(scope, name, Symbol::Class(index));
        if let Some(body) = body {
            self.visit_block(body, Some(index));
        }
    }

    fn docstring(&self, body: Node<'_>) -> Option<String> {
        let first = named_children(body).next()?;
        if first.kind() != "expression_statement" {
            return None;
        }
        let expr = named_children(first).next()?;
        if !matches!(expr.kind(), "string" | "concatenated_string") {
            return None;
        }
        match self.literal(None, expr) {
            Value::Str(doc) => Some(doc),
            _ => None,
        }
    }
}

/// Blocks nested directly in a compound statement (`if`/`try`/`with` and
/// their clauses).
fn nested_blocks(stmt: Node<'_>) -> Vec<Node<'_>> {
    let mut blocks = Vec::new();
    for child in named_children(stmt) {
        match child.kind() {
            "block" => blocks.push(child),
            "elif_clause" | "else_clause" | "except_clause" | "except_group_clause"
            | "finally_clause" => blocks.extend(named_children(child).filter(|c| c.kind() == "block")),
            _ => {}
        }
    }
    blocks
}

fn arguments_of(args: Node<'_>) -> (Vec<Node<'_>>, Vec<(Node<'_>, Node<'_>)>) {
    let mut positional = Vec::new();
    let mut keywords = Vec::new();
    for arg in named_children(args) {
        if arg.kind() == "keyword_argument" {
            if let (Some(k), Some(v)) = (
                arg.child_by_field_name("name"),
                arg.child_by_field_name("value"),
            ) {
                keywords.push((k, v));
            }
        } else {
            positional.push(arg);
        }
    }
    (positional, keywords)
}

fn splat_name(tree: &SyntaxTree, splat: Node<'_>) -> String {
    named_children(splat)
        .next()
        .map(|n| tree.text(n).to_string())
        .unwrap_or_default()
}

fn normalize_dotted(text: &str) -> String {
    text.split('.').map(str::trim).collect::<Vec<_>>().join(".")
}

/// True when `call` is an injection marker: its callee is `Depends` or an
/// attribute chain ending in `.Depends`.
pub fn is_depends_call(tree: &SyntaxTree, call: Node<'_>) -> bool {
    call.child_by_field_name("function")
        .and_then(|f| dotted_parts(tree, f))
        .is_some_and(|parts| parts.last().is_some_and(|p| p == "Depends"))
}

/// For a `Depends(...)` call: `Some(Some(parts))` for a dotted provider,
/// `Some(None)` for a marker whose provider is absent or not a dotted name,
/// `None` when `call` is not a marker at all.
pub fn dependency_provider(tree: &SyntaxTree, call: Node<'_>) -> Option<Option<Vec<String>>> {
    if !is_depends_call(tree, call) {
        return None;
    }
    let (positional, keywords) = call_arguments(call);
    let provider = positional.first().copied().or_else(|| {
        keywords
            .iter()
            .find(|(k, _)| tree.text(*k) == "dependency")
            .map(|(_, v)| *v)
    });
    Some(provider.and_then(|p| dotted_parts(tree, p)))
}
