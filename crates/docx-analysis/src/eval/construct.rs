//! Static construction of class instances.
//!
//! Binds call arguments to `__init__` and interprets the constructor body
//! just far enough to learn the attributes it assigns on `self`.

use docx_core::errors::EvalError;
use rustc_hash::FxHashMap;
use tree_sitter::Node;

use super::literal::{apply_binary, eval_call_arguments, eval_lenient, Arguments, EvalScope, InstanceView};
use super::value::Value;
use crate::model::{ClassRef, FunctionRef, ParamKind};
use crate::parsers::{parse_source, SyntaxTree};
use crate::query::{call_arguments, dotted_parts, find_nodes, named_children};
use crate::resolver::{Object, Resolver};

/// Nested `super().__init__` chains stop here.
const MAX_INIT_DEPTH: usize = 32;

/// An instance built without running any code.
#[derive(Debug, Clone, PartialEq)]
pub struct Constructed {
    pub class: ClassRef,
    pub attrs: FxHashMap<String, Value>,
}

impl Constructed {
    /// `instance.name`: what the constructor chain set, else a literal class
    /// attribute, else `Unknown`.
    pub fn attr(&self, resolver: &dyn Resolver, name: &str) -> Value {
        match self.attrs.get(name) {
            Some(value) => value.clone(),
            None => resolver.class_constant(self.class, name).unwrap_or(Value::Unknown),
        }
    }
}

/// `class(*args)`: binding errors propagate; everything the body computes
/// beyond literals becomes `Unknown`.
pub fn construct(resolver: &dyn Resolver, class: ClassRef, args: Arguments) -> Result<Constructed, EvalError> {
    let mut attrs = FxHashMap::default();
    match resolver.find_method(class, "__init__") {
        Some(init) => run_init(resolver, class, init, args, &mut attrs, 0)?,
        None if args.positional.is_empty() && args.keywords.is_empty() => {}
        None => {
            let name = &resolver.class_def(class).name;
            return Err(match args.keywords.into_iter().next() {
                Some((keyword, _)) => EvalError::UnexpectedKeyword {
                    callable: name.clone(),
                    keyword,
                },
                None => EvalError::TooManyArguments {
                    callable: name.clone(),
                    expected: 0,
                    given: args.positional.len(),
                },
            });
        }
    }
    Ok(Constructed { class, attrs })
}

/// Bind `args` to the parameters of `function`, skipping `self`.
pub fn bind_arguments(
    resolver: &dyn Resolver,
    function: FunctionRef,
    args: Arguments,
) -> Result<FxHashMap<String, Value>, EvalError> {
    let def = resolver.function_def(function);
    let callable = def.qualname.clone();
    let skip = usize::from(def.owner.is_some() && def.params.first().is_some_and(|p| p.kind == ParamKind::Positional));
    let params = &def.params[skip.min(def.params.len())..];

    let positional: Vec<&str> = params
        .iter()
        .filter(|p| p.kind == ParamKind::Positional)
        .map(|p| p.name.as_str())
        .collect();
    let var_args = params.iter().find(|p| p.kind == ParamKind::VarArgs);
    let var_keywords = params.iter().find(|p| p.kind == ParamKind::VarKeywords);

    let mut bound: FxHashMap<String, Value> = FxHashMap::default();
    let given = args.positional.len();
    let mut extra = Vec::new();
    for (i, value) in args.positional.into_iter().enumerate() {
        match positional.get(i) {
            Some(name) => {
                bound.insert(name.to_string(), value);
            }
            None if var_args.is_some() => extra.push(value),
            None => {
                return Err(EvalError::TooManyArguments {
                    callable,
                    expected: positional.len(),
                    given,
                })
            }
        }
    }
    if let Some(var_args) = var_args {
        bound.insert(var_args.name.clone(), Value::Tuple(extra));
    }

    let mut extra_keywords = Vec::new();
    for (keyword, value) in args.keywords {
        let named = params
            .iter()
            .any(|p| p.name == keyword && matches!(p.kind, ParamKind::Positional | ParamKind::KeywordOnly));
        if named {
            if bound.contains_key(&keyword) {
                return Err(EvalError::MultipleValues {
                    callable,
                    param: keyword,
                });
            }
            bound.insert(keyword, value);
        } else if var_keywords.is_some() {
            extra_keywords.push((Value::Str(keyword), value));
        } else {
            return Err(EvalError::UnexpectedKeyword { callable, keyword });
        }
    }
    if let Some(var_keywords) = var_keywords {
        bound.insert(var_keywords.name.clone(), Value::Dict(extra_keywords));
    }

    for param in params {
        if !matches!(param.kind, ParamKind::Positional | ParamKind::KeywordOnly) || bound.contains_key(&param.name) {
            continue;
        }
        match &param.default {
            Some(default) => {
                bound.insert(param.name.clone(), default.clone());
            }
            None => {
                return Err(EvalError::MissingArgument {
                    callable,
                    param: param.name.clone(),
                })
            }
        }
    }
    Ok(bound)
}

fn run_init(
    resolver: &dyn Resolver,
    instance: ClassRef,
    init: FunctionRef,
    args: Arguments,
    attrs: &mut FxHashMap<String, Value>,
    depth: usize,
) -> Result<(), EvalError> {
    if depth > MAX_INIT_DEPTH {
        tracing::debug!(class = %resolver.class_def(instance).name, "constructor chain too deep");
        return Ok(());
    }
    let mut locals = bind_arguments(resolver, init, args)?;
    let def = resolver.function_def(init);
    let tree = match parse_source(&resolver.function_source(init), &def.qualname) {
        Ok(tree) => tree,
        Err(error) => {
            tracing::debug!(function = %def.qualname, %error, "constructor source unparsable");
            return Ok(());
        }
    };
    let Some(body) = find_nodes(tree.root(), "function_definition", &[])
        .next()
        .and_then(|f| f.child_by_field_name("body"))
    else {
        return Ok(());
    };
    let mut interp = InitBody {
        resolver,
        tree: &tree,
        module: def.module,
        instance,
        defining: def.owner,
        locals: &mut locals,
        attrs,
        depth,
    };
    interp.block(body)?;
    Ok(())
}

enum Flow {
    Next,
    Return,
}

struct InitBody<'a> {
    resolver: &'a dyn Resolver,
    tree: &'a SyntaxTree,
    module: crate::model::ModuleId,
    instance: ClassRef,
    defining: Option<ClassRef>,
    locals: &'a mut FxHashMap<String, Value>,
    attrs: &'a mut FxHashMap<String, Value>,
    depth: usize,
}

impl InitBody<'_> {
    fn eval(&self, node: Node<'_>) -> Value {
        let class_name = &self.resolver.class_def(self.instance).name;
        let scope = EvalScope::module(self.resolver, self.module, &*self.locals).with_instance(InstanceView {
            class: self.instance,
            class_name,
            attrs: &*self.attrs,
        });
        eval_lenient(self.tree, node, &scope)
    }

    fn block(&mut self, block: Node<'_>) -> Result<Flow, EvalError> {
        for stmt in named_children(block) {
            if let Flow::Return = self.statement(stmt)? {
                return Ok(Flow::Return);
            }
        }
        Ok(Flow::Next)
    }

    fn statement(&mut self, stmt: Node<'_>) -> Result<Flow, EvalError> {
        match stmt.kind() {
            "expression_statement" => {
                let Some(inner) = named_children(stmt).next() else {
                    return Ok(Flow::Next);
                };
                match inner.kind() {
                    "assignment" => self.assignment(inner),
                    "augmented_assignment" => self.augmented(inner),
                    "call" => self.init_call(inner)?,
                    _ => {}
                }
                Ok(Flow::Next)
            }
            "if_statement" => self.if_statement(stmt),
            "try_statement" | "with_statement" => match stmt.child_by_field_name("body") {
                Some(body) => self.block(body),
                None => Ok(Flow::Next),
            },
            "return_statement" | "raise_statement" => Ok(Flow::Return),
            _ => Ok(Flow::Next),
        }
    }

    fn store(&mut self, target: Node<'_>, value: Value) {
        match target.kind() {
            "identifier" => {
                self.locals.insert(self.tree.text(target).to_string(), value);
            }
            "attribute" => {
                if let Some([receiver, attr]) = dotted_parts(self.tree, target).as_deref() {
                    if receiver == "self" {
                        self.attrs.insert(attr.clone(), value);
                    }
                }
            }
            "pattern_list" | "tuple_pattern" | "list_pattern" => {
                for name in named_children(target) {
                    self.store(name, Value::Unknown);
                }
            }
            _ => {}
        }
    }

    fn assignment(&mut self, assign: Node<'_>) {
        let Some(left) = assign.child_by_field_name("left") else {
            return;
        };
        let mut targets = vec![left];
        let mut right = assign.child_by_field_name("right");
        while let Some(r) = right.filter(|r| r.kind() == "assignment") {
            targets.extend(r.child_by_field_name("left"));
            right = r.child_by_field_name("right");
        }
        // `x: int` alone binds nothing.
        let Some(right) = right else {
            return;
        };
        let value = self.eval(right);
        for target in targets {
            self.store(target, value.clone());
        }
    }

    fn augmented(&mut self, assign: Node<'_>) {
        let (Some(left), Some(right), Some(operator)) = (
            assign.child_by_field_name("left"),
            assign.child_by_field_name("right"),
            assign.child_by_field_name("operator"),
        ) else {
            return;
        };
        let current = self.eval(left);
        let operand = self.eval(right);
        let operator = self.tree.text(operator).trim_end_matches('=');
        let value = apply_binary(operator, current, operand);
        self.store(left, value);
    }

    fn if_statement(&mut self, stmt: Node<'_>) -> Result<Flow, EvalError> {
        let Some(condition) = stmt.child_by_field_name("condition") else {
            return Ok(Flow::Next);
        };
        match self.eval(condition).truthy() {
            Some(true) => match stmt.child_by_field_name("consequence") {
                Some(body) => self.block(body),
                None => Ok(Flow::Next),
            },
            Some(false) => {
                for clause in named_children(stmt) {
                    match clause.kind() {
                        "elif_clause" => {
                            let Some(condition) = clause.child_by_field_name("condition") else {
                                continue;
                            };
                            match self.eval(condition).truthy() {
                                Some(true) => {
                                    return match clause.child_by_field_name("consequence") {
                                        Some(body) => self.block(body),
                                        None => Ok(Flow::Next),
                                    }
                                }
                                Some(false) => continue,
                                None => return Ok(Flow::Next),
                            }
                        }
                        "else_clause" => {
                            return match clause.child_by_field_name("body") {
                                Some(body) => self.block(body),
                                None => Ok(Flow::Next),
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Flow::Next)
            }
            None => Ok(Flow::Next),
        }
    }

    /// `super().__init__(...)`, `super(Cls, self).__init__(...)` and
    /// `Base.__init__(self, ...)`. Other calls are ignored.
    fn init_call(&mut self, call: Node<'_>) -> Result<(), EvalError> {
        let Some(function) = call.child_by_field_name("function") else {
            return Ok(());
        };
        if function.kind() != "attribute" {
            return Ok(());
        }
        let (Some(object), Some(attribute)) = (
            function.child_by_field_name("object"),
            function.child_by_field_name("attribute"),
        ) else {
            return Ok(());
        };
        if self.tree.text(attribute) != "__init__" {
            return Ok(());
        }

        let (target, explicit_self) = if is_super_call(self.tree, object) {
            (self.super_init(), false)
        } else {
            let base = dotted_parts(self.tree, object)
                .and_then(|parts| self.resolver.resolve_path(self.module, &parts));
            match base {
                Some(Object::Class(base)) => (self.resolver.find_method(base, "__init__"), true),
                _ => (None, false),
            }
        };
        let Some(target) = target else {
            return Ok(());
        };
        let Some(mut args) = self.arguments(call) else {
            return Ok(());
        };
        if explicit_self {
            if args.positional.is_empty() {
                return Ok(());
            }
            args.positional.remove(0);
        }
        run_init(self.resolver, self.instance, target, args, self.attrs, self.depth + 1)
    }

    /// The next `__init__` after the defining class in the instance lineage.
    fn super_init(&self) -> Option<FunctionRef> {
        let defining = self.defining?;
        let lineage = self.resolver.lineage(self.instance);
        let position = lineage.iter().position(|c| *c == defining)?;
        self.resolver.find_method_from(self.instance, "__init__", position + 1)
    }

    /// Strict argument evaluation, else per-argument lenient evaluation.
    /// Splats that cannot be evaluated make the call unusable.
    fn arguments(&self, call: Node<'_>) -> Option<Arguments> {
        let class_name = &self.resolver.class_def(self.instance).name;
        let scope = EvalScope::module(self.resolver, self.module, &*self.locals).with_instance(InstanceView {
            class: self.instance,
            class_name,
            attrs: &*self.attrs,
        });
        if let Ok(args) = eval_call_arguments(self.tree, call, &scope) {
            return Some(args);
        }
        let (positional, keywords) = call_arguments(call);
        if positional
            .iter()
            .any(|p| matches!(p.kind(), "list_splat" | "dictionary_splat"))
        {
            return None;
        }
        Some(Arguments {
            positional: positional
                .into_iter()
                .map(|p| eval_lenient(self.tree, p, &scope))
                .collect(),
            keywords: keywords
                .into_iter()
                .map(|(k, v)| (self.tree.text(k).to_string(), eval_lenient(self.tree, v, &scope)))
                .collect(),
        })
    }
}

fn is_super_call(tree: &SyntaxTree, node: Node<'_>) -> bool {
    node.kind() == "call"
        && node
            .child_by_field_name("function")
            .is_some_and(|f| f.kind() == "identifier" && tree.text(f) == "super")
}
