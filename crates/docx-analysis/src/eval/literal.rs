//! The restricted literal evaluator.

use docx_core::errors::EvalError;
use rustc_hash::FxHashMap;
use tree_sitter::Node;

use super::format::{apply_format_spec, str_format};
use super::value::{Value, MAX_STRING_LEN};
use crate::model::{ClassRef, ModuleId};
use crate::parsers::SyntaxTree;
use crate::query::{call_arguments, dotted_parts, named_children};
use crate::resolver::{Object, Resolver};

/// `self` while interpreting a constructor body.
#[derive(Clone, Copy)]
pub struct InstanceView<'a> {
    pub class: ClassRef,
    pub class_name: &'a str,
    /// Attributes assigned on `self` so far; class attributes back them.
    pub attrs: &'a FxHashMap<String, Value>,
}

/// What names mean during one evaluation.
#[derive(Clone, Copy)]
pub struct EvalScope<'a> {
    /// Module-level resolution; `None` restricts names to `locals`.
    pub resolver: Option<(&'a dyn Resolver, ModuleId)>,
    pub locals: &'a FxHashMap<String, Value>,
    pub instance: Option<InstanceView<'a>>,
}

impl<'a> EvalScope<'a> {
    /// Literals plus the given bindings, nothing else.
    pub fn literal(locals: &'a FxHashMap<String, Value>) -> Self {
        Self {
            resolver: None,
            locals,
            instance: None,
        }
    }

    pub fn module(
        resolver: &'a dyn Resolver,
        module: ModuleId,
        locals: &'a FxHashMap<String, Value>,
    ) -> Self {
        Self {
            resolver: Some((resolver, module)),
            locals,
            instance: None,
        }
    }

    pub fn with_instance(mut self, instance: InstanceView<'a>) -> Self {
        self.instance = Some(instance);
        self
    }
}

/// Evaluated call arguments, splats expanded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    pub positional: Vec<Value>,
    pub keywords: Vec<(String, Value)>,
}

/// Evaluate, mapping every failure to [`Value::Unknown`].
pub fn eval_lenient(tree: &SyntaxTree, node: Node<'_>, scope: &EvalScope<'_>) -> Value {
    eval_expr(tree, node, scope).unwrap_or(Value::Unknown)
}

/// Evaluate the arguments of `call`.
pub fn eval_call_arguments(
    tree: &SyntaxTree,
    call: Node<'_>,
    scope: &EvalScope<'_>,
) -> Result<Arguments, EvalError> {
    let (positional, keywords) = call_arguments(call);
    let mut args = Arguments::default();
    for node in positional {
        match node.kind() {
            "list_splat" => {
                let inner = first_child(tree, node)?;
                match eval_expr(tree, inner, scope)? {
                    Value::List(items) | Value::Tuple(items) => args.positional.extend(items),
                    Value::Str(s) => args
                        .positional
                        .extend(s.chars().map(|c| Value::Str(c.to_string()))),
                    _ => return Err(unsupported(tree, node)),
                }
            }
            "dictionary_splat" => {
                let inner = first_child(tree, node)?;
                match eval_expr(tree, inner, scope)? {
                    Value::Dict(items) => {
                        for (k, v) in items {
                            match k {
                                Value::Str(k) => args.keywords.push((k, v)),
                                _ => return Err(unsupported(tree, node)),
                            }
                        }
                    }
                    _ => return Err(unsupported(tree, node)),
                }
            }
            _ => args.positional.push(eval_expr(tree, node, scope)?),
        }
    }
    for (name, value) in keywords {
        args.keywords
            .push((tree.text(name).to_string(), eval_expr(tree, value, scope)?));
    }
    Ok(args)
}

fn unsupported(tree: &SyntaxTree, node: Node<'_>) -> EvalError {
    EvalError::Unsupported {
        kind: node.kind().to_string(),
        text: tree.text(node).to_string(),
    }
}

fn first_child<'t>(tree: &SyntaxTree, node: Node<'t>) -> Result<Node<'t>, EvalError> {
    named_children(node).next().ok_or_else(|| unsupported(tree, node))
}

fn field<'t>(tree: &SyntaxTree, node: Node<'t>, name: &str) -> Result<Node<'t>, EvalError> {
    node.child_by_field_name(name)
        .ok_or_else(|| unsupported(tree, node))
}

fn mismatch(operator: &str, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeMismatch {
        operator: operator.to_string(),
        left: left.type_name().to_string(),
        right: right.type_name().to_string(),
    }
}

/// Evaluate one expression node.
pub fn eval_expr(
    tree: &SyntaxTree,
    node: Node<'_>,
    scope: &EvalScope<'_>,
) -> Result<Value, EvalError> {
    match node.kind() {
        "integer" => parse_int(tree.text(node)).ok_or_else(|| unsupported(tree, node)),
        "float" => parse_float(tree.text(node)).ok_or_else(|| unsupported(tree, node)),
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        "none" => Ok(Value::None),
        "ellipsis" => Ok(Value::Unknown),
        "string" => eval_string(tree, node, scope),
        "concatenated_string" => {
            let mut out = String::new();
            for part in named_children(node) {
                match eval_string(tree, part, scope)? {
                    Value::Str(s) => out.push_str(&s),
                    _ => return Ok(Value::Unknown),
                }
            }
            Ok(Value::Str(out))
        }
        "parenthesized_expression" => eval_expr(tree, first_child(tree, node)?, scope),
        "tuple" | "expression_list" => Ok(Value::Tuple(eval_sequence(tree, node, scope)?)),
        "list" => Ok(Value::List(eval_sequence(tree, node, scope)?)),
        "set" => Ok(Value::List(eval_sequence(tree, node, scope)?)),
        "dictionary" => eval_dict(tree, node, scope),
        "identifier" => eval_name(&[tree.text(node).to_string()], scope),
        "attribute" => eval_attribute(tree, node, scope),
        "unary_operator" => {
            let operand = eval_expr(tree, field(tree, node, "argument")?, scope)?;
            let operator = tree.text(field(tree, node, "operator")?);
            match (operator, &operand) {
                (_, Value::Unknown) => Ok(Value::Unknown),
                ("-", Value::Int(i)) => i.checked_neg().map(Value::Int).ok_or_else(|| unsupported(tree, node)),
                ("-", Value::Float(f)) => Ok(Value::Float(-f)),
                ("+", Value::Int(_) | Value::Float(_)) => Ok(operand.clone()),
                ("~", Value::Int(i)) => Ok(Value::Int(!i)),
                ("-" | "+" | "~", Value::Bool(b)) => {
                    let i = i64::from(*b);
                    Ok(Value::Int(match operator {
                        "-" => -i,
                        "~" => !i,
                        _ => i,
                    }))
                }
                _ => Err(mismatch(operator, &operand, &Value::None)),
            }
        }
        "not_operator" => {
            let operand = eval_expr(tree, field(tree, node, "argument")?, scope)?;
            Ok(operand.truthy().map(|b| Value::Bool(!b)).unwrap_or(Value::Unknown))
        }
        "boolean_operator" => {
            let left = eval_expr(tree, field(tree, node, "left")?, scope)?;
            let operator = tree.text(field(tree, node, "operator")?);
            let Some(truthy) = left.truthy() else {
                return Ok(Value::Unknown);
            };
            let short_circuit = match operator {
                "and" => !truthy,
                _ => truthy,
            };
            if short_circuit {
                Ok(left)
            } else {
                eval_expr(tree, field(tree, node, "right")?, scope)
            }
        }
        "binary_operator" => {
            let left = eval_expr(tree, field(tree, node, "left")?, scope)?;
            let right = eval_expr(tree, field(tree, node, "right")?, scope)?;
            let operator = tree.text(field(tree, node, "operator")?);
            binary(operator, left, right).map_err(|e| match e {
                BinaryError::Mismatch(e) => e,
                BinaryError::Unsupported => unsupported(tree, node),
            })
        }
        "comparison_operator" => eval_comparison(tree, node, scope),
        "conditional_expression" => {
            let mut parts = named_children(node);
            let (Some(body), Some(condition), Some(orelse)) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(unsupported(tree, node));
            };
            match eval_expr(tree, condition, scope)?.truthy() {
                Some(true) => eval_expr(tree, body, scope),
                Some(false) => eval_expr(tree, orelse, scope),
                None => Ok(Value::Unknown),
            }
        }
        "subscript" => eval_subscript(tree, node, scope),
        "call" => eval_call(tree, node, scope),
        _ => Err(unsupported(tree, node)),
    }
}

fn eval_sequence(
    tree: &SyntaxTree,
    node: Node<'_>,
    scope: &EvalScope<'_>,
) -> Result<Vec<Value>, EvalError> {
    let mut items = Vec::new();
    for child in named_children(node) {
        if child.kind() == "list_splat" {
            match eval_expr(tree, first_child(tree, child)?, scope)? {
                Value::List(inner) | Value::Tuple(inner) => items.extend(inner),
                Value::Unknown => return Ok(vec![Value::Unknown]),
                _ => return Err(unsupported(tree, child)),
            }
        } else {
            items.push(eval_expr(tree, child, scope)?);
        }
    }
    Ok(items)
}

fn eval_dict(tree: &SyntaxTree, node: Node<'_>, scope: &EvalScope<'_>) -> Result<Value, EvalError> {
    let mut items: Vec<(Value, Value)> = Vec::new();
    let insert = |items: &mut Vec<(Value, Value)>, k: Value, v: Value| {
        match items.iter_mut().find(|(existing, _)| *existing == k) {
            Some(slot) => slot.1 = v,
            None => items.push((k, v)),
        }
    };
    for child in named_children(node) {
        match child.kind() {
            "pair" => {
                let key = eval_expr(tree, field(tree, child, "key")?, scope)?;
                let value = eval_expr(tree, field(tree, child, "value")?, scope)?;
                insert(&mut items, key, value);
            }
            "dictionary_splat" => match eval_expr(tree, first_child(tree, child)?, scope)? {
                Value::Dict(inner) => {
                    for (k, v) in inner {
                        insert(&mut items, k, v);
                    }
                }
                Value::Unknown => return Ok(Value::Unknown),
                _ => return Err(unsupported(tree, child)),
            },
            _ => return Err(unsupported(tree, child)),
        }
    }
    Ok(Value::Dict(items))
}

/// A name or dotted chain: locals and `self` first, then the module.
fn eval_name(parts: &[String], scope: &EvalScope<'_>) -> Result<Value, EvalError> {
    let Some((head, rest)) = parts.split_first() else {
        return Ok(Value::Unknown);
    };
    if let Some(value) = scope.locals.get(head) {
        return value_attributes(value.clone(), rest, parts);
    }
    if head == "self" {
        if let Some(instance) = scope.instance {
            return match rest {
                [] => Ok(Value::Unknown),
                [class, name, tail @ ..] if class == "__class__" && name == "__name__" => {
                    value_attributes(Value::Str(instance.class_name.to_string()), tail, parts)
                }
                [attr, tail @ ..] => {
                    let value = instance.attrs.get(attr).cloned().or_else(|| {
                        scope
                            .resolver
                            .and_then(|(resolver, _)| resolver.class_constant(instance.class, attr))
                    });
                    match value {
                        Some(value) => value_attributes(value, tail, parts),
                        None => Ok(Value::Unknown),
                    }
                }
            };
        }
    }
    let Some((resolver, module)) = scope.resolver else {
        return Err(EvalError::UnresolvedName { name: head.clone() });
    };
    let mut object = resolver
        .resolve_in_module(module, head)
        .ok_or_else(|| EvalError::UnresolvedName { name: head.clone() })?;
    for (i, attr) in rest.iter().enumerate() {
        if let Object::Constant(value) = object {
            return value_attributes(value, &rest[i..], parts);
        }
        object = resolver
            .resolve_attribute(&object, attr)
            .ok_or_else(|| EvalError::UnresolvedName {
                name: parts[..i + 2].join("."),
            })?;
    }
    Ok(match object {
        Object::Constant(value) => value,
        _ => Value::Unknown,
    })
}

/// Attribute access on an already-evaluated value. Only `Unknown` has
/// attributes here; anything else is unsupported.
fn value_attributes(value: Value, rest: &[String], parts: &[String]) -> Result<Value, EvalError> {
    if rest.is_empty() || value.is_unknown() {
        return Ok(value);
    }
    Err(EvalError::Unsupported {
        kind: "attribute".to_string(),
        text: parts.join("."),
    })
}

fn eval_attribute(tree: &SyntaxTree, node: Node<'_>, scope: &EvalScope<'_>) -> Result<Value, EvalError> {
    if let Some(parts) = dotted_parts(tree, node) {
        return eval_name(&parts, scope);
    }
    // `"abc".upper` without a call, `f().x`
    let object = eval_expr(tree, field(tree, node, "object")?, scope)?;
    if object.is_unknown() {
        return Ok(Value::Unknown);
    }
    Err(unsupported(tree, node))
}

/// Apply a binary operator, `Unknown` on any failure. Used for `x += y`.
pub(crate) fn apply_binary(operator: &str, left: Value, right: Value) -> Value {
    binary(operator, left, right).unwrap_or(Value::Unknown)
}

enum BinaryError {
    Mismatch(EvalError),
    Unsupported,
}

fn binary(operator: &str, left: Value, right: Value) -> Result<Value, BinaryError> {
    if left.is_unknown() || right.is_unknown() {
        return Ok(Value::Unknown);
    }
    let err = |l: &Value, r: &Value| BinaryError::Mismatch(mismatch(operator, l, r));
    let as_float = |v: &Value| match v {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        _ => None,
    };
    let result = match (operator, &left, &right) {
        ("+", Value::Str(a), Value::Str(b)) => Value::Str(format!("{a}{b}")),
        ("+", Value::List(a), Value::List(b)) => Value::List(a.iter().chain(b).cloned().collect()),
        ("+", Value::Tuple(a), Value::Tuple(b)) => Value::Tuple(a.iter().chain(b).cloned().collect()),
        ("*", Value::Str(s), n) | ("*", n, Value::Str(s)) if n.as_int().is_some() => {
            Value::Str(repeat(s, n.as_int().unwrap_or(0))?)
        }
        ("%", Value::Str(_), _) => return Err(BinaryError::Unsupported),
        (op, l, r) if l.as_int().is_some() && r.as_int().is_some() => {
            let (a, b) = (l.as_int().unwrap_or(0), r.as_int().unwrap_or(0));
            match op {
                "+" => Value::Int(a.checked_add(b).ok_or(BinaryError::Unsupported)?),
                "-" => Value::Int(a.checked_sub(b).ok_or(BinaryError::Unsupported)?),
                "*" => Value::Int(a.checked_mul(b).ok_or(BinaryError::Unsupported)?),
                "//" if b != 0 => Value::Int(floor_div(a, b).ok_or(BinaryError::Unsupported)?),
                "%" if b != 0 => Value::Int(floor_mod(a, b).ok_or(BinaryError::Unsupported)?),
                "/" if b != 0 => Value::Float(a as f64 / b as f64),
                "**" if b >= 0 => Value::Int(
                    u32::try_from(b)
                        .ok()
                        .and_then(|e| a.checked_pow(e))
                        .ok_or(BinaryError::Unsupported)?,
                ),
                "&" => Value::Int(a & b),
                "|" => Value::Int(a | b),
                "^" => Value::Int(a ^ b),
                "<<" if (0..64).contains(&b) => Value::Int(a.checked_shl(b as u32).ok_or(BinaryError::Unsupported)?),
                ">>" if b >= 0 => Value::Int(a >> b.min(63)),
                _ => return Err(BinaryError::Unsupported),
            }
        }
        (op, l, r) if as_float(l).is_some() && as_float(r).is_some() => {
            let (a, b) = (as_float(l).unwrap_or(0.0), as_float(r).unwrap_or(0.0));
            match op {
                "+" => Value::Float(a + b),
                "-" => Value::Float(a - b),
                "*" => Value::Float(a * b),
                "/" if b != 0.0 => Value::Float(a / b),
                "**" => Value::Float(a.powf(b)),
                _ => return Err(BinaryError::Unsupported),
            }
        }
        _ => return Err(err(&left, &right)),
    };
    Ok(result)
}

/// Python `//`: rounds toward negative infinity.
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    Some(if a % b != 0 && (a < 0) != (b < 0) { q - 1 } else { q })
}

/// Python `%`: the result takes the sign of the divisor.
fn floor_mod(a: i64, b: i64) -> Option<i64> {
    // `i64::MIN % -1` overflows in Rust; Python gives 0.
    let r = if b == -1 { 0 } else { a.checked_rem(b)? };
    Some(if r != 0 && (r < 0) != (b < 0) { r + b } else { r })
}

/// `s * n`, refusing results longer than [`MAX_STRING_LEN`].
fn repeat(s: &str, n: i64) -> Result<String, BinaryError> {
    let count = usize::try_from(n.max(0)).map_err(|_| BinaryError::Unsupported)?;
    match s.len().checked_mul(count) {
        Some(len) if len <= MAX_STRING_LEN => Ok(s.repeat(count)),
        _ => Err(BinaryError::Unsupported),
    }
}

fn eval_comparison(tree: &SyntaxTree, node: Node<'_>, scope: &EvalScope<'_>) -> Result<Value, EvalError> {
    let operands: Vec<Node<'_>> = named_children(node).collect();
    let mut cursor = node.walk();
    let operators: Vec<&str> = node
        .children_by_field_name("operators", &mut cursor)
        .map(|op| tree.text(op))
        .collect();
    if operands.len() != operators.len() + 1 {
        return Err(unsupported(tree, node));
    }
    let mut left = eval_expr(tree, operands[0], scope)?;
    for (operator, right_node) in operators.iter().zip(&operands[1..]) {
        let right = eval_expr(tree, *right_node, scope)?;
        if left.is_unknown() || right.is_unknown() {
            return Ok(Value::Unknown);
        }
        let operator = operator.split_whitespace().collect::<Vec<_>>().join(" ");
        let holds = match operator.as_str() {
            "==" => Some(left == right),
            "!=" => Some(left != right),
            "is" => identical(&left, &right),
            "is not" => identical(&left, &right).map(|same| !same),
            "in" | "not in" => {
                let found = match &right {
                    Value::List(items) | Value::Tuple(items) => Some(items.contains(&left)),
                    Value::Dict(items) => Some(items.iter().any(|(k, _)| *k == left)),
                    Value::Str(s) => left.as_str().map(|needle| s.contains(needle)),
                    _ => None,
                };
                found.map(|f| if operator == "in" { f } else { !f })
            }
            "<" | "<=" | ">" | ">=" => ordering(&left, &right).map(|ord| match operator.as_str() {
                "<" => ord.is_lt(),
                "<=" => ord.is_le(),
                ">" => ord.is_gt(),
                _ => ord.is_ge(),
            }),
            _ => None,
        };
        match holds {
            Some(true) => left = right,
            Some(false) => return Ok(Value::Bool(false)),
            None => return Ok(Value::Unknown),
        }
    }
    Ok(Value::Bool(true))
}

/// Identity is only decidable for the `None`/`True`/`False` singletons.
fn identical(left: &Value, right: &Value) -> Option<bool> {
    match (left, right) {
        (Value::None | Value::Bool(_), Value::None | Value::Bool(_)) => Some(left == right),
        (Value::None, _) | (_, Value::None) => Some(false),
        _ => None,
    }
}

fn ordering(left: &Value, right: &Value) -> Option<std::cmp::Ordering> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => {
            let a = match left {
                Value::Int(i) => *i as f64,
                Value::Float(f) => *f,
                _ => return None,
            };
            let b = match right {
                Value::Int(i) => *i as f64,
                Value::Float(f) => *f,
                _ => return None,
            };
            a.partial_cmp(&b)
        }
    }
}

fn eval_subscript(tree: &SyntaxTree, node: Node<'_>, scope: &EvalScope<'_>) -> Result<Value, EvalError> {
    let value = eval_expr(tree, field(tree, node, "value")?, scope)?;
    let index_node = field(tree, node, "subscript")?;
    if index_node.kind() == "slice" {
        return Err(unsupported(tree, node));
    }
    let index = eval_expr(tree, index_node, scope)?;
    if value.is_unknown() || index.is_unknown() {
        return Ok(Value::Unknown);
    }
    let positional = |len: usize| {
        index.as_int().and_then(|i| {
            let i = if i < 0 { i + len as i64 } else { i };
            usize::try_from(i).ok().filter(|i| *i < len)
        })
    };
    let found = match &value {
        Value::Dict(_) => value.dict_get(&index).cloned(),
        Value::List(items) | Value::Tuple(items) => positional(items.len()).map(|i| items[i].clone()),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            positional(chars.len()).map(|i| Value::Str(chars[i].to_string()))
        }
        _ => None,
    };
    found.ok_or_else(|| unsupported(tree, node))
}

fn eval_call(tree: &SyntaxTree, node: Node<'_>, scope: &EvalScope<'_>) -> Result<Value, EvalError> {
    let function = field(tree, node, "function")?;
    let args = eval_call_arguments(tree, node, scope)?;

    if function.kind() == "identifier" {
        let name = tree.text(function);
        if !scope.locals.contains_key(name) {
            if let Some(result) = builtin_call(name, &args) {
                return Ok(result);
            }
        }
        // A defined callable we cannot run.
        eval_name(&[name.to_string()], scope)?;
        return Ok(Value::Unknown);
    }

    if function.kind() == "attribute" {
        let object_node = field(tree, function, "object")?;
        let method = tree.text(field(tree, function, "attribute")?);
        let receiver = match dotted_parts(tree, object_node) {
            Some(parts) => eval_name(&parts, scope)?,
            None => eval_expr(tree, object_node, scope)?,
        };
        if receiver.is_unknown() || args.positional.iter().any(Value::is_unknown)
            || args.keywords.iter().any(|(_, v)| v.is_unknown())
        {
            return Ok(Value::Unknown);
        }
        return method_call(&receiver, method, &args).ok_or_else(|| unsupported(tree, node));
    }

    eval_expr(tree, function, scope)?;
    Ok(Value::Unknown)
}

fn builtin_call(name: &str, args: &Arguments) -> Option<Value> {
    if !args.keywords.is_empty() {
        return None;
    }
    let single = match args.positional.as_slice() {
        [v] => Some(v),
        _ => None,
    };
    if args.positional.iter().any(Value::is_unknown) {
        return matches!(name, "str" | "int" | "float" | "bool" | "len" | "repr").then_some(Value::Unknown);
    }
    match name {
        "str" => Some(Value::Str(single.map(Value::py_str).unwrap_or_default())),
        "repr" => single.map(|v| Value::Str(v.py_repr())),
        "bool" => Some(Value::Bool(single.and_then(Value::truthy).unwrap_or(false))),
        "int" => match single? {
            Value::Int(i) => Some(Value::Int(*i)),
            Value::Bool(b) => Some(Value::Int(i64::from(*b))),
            Value::Float(f) => Some(Value::Int(f.trunc() as i64)),
            Value::Str(s) => s.trim().parse().ok().map(Value::Int),
            _ => None,
        },
        "float" => match single? {
            Value::Int(i) => Some(Value::Float(*i as f64)),
            Value::Float(f) => Some(Value::Float(*f)),
            Value::Str(s) => s.trim().parse().ok().map(Value::Float),
            _ => None,
        },
        "len" => match single? {
            Value::Str(s) => Some(Value::Int(s.chars().count() as i64)),
            Value::List(items) | Value::Tuple(items) => Some(Value::Int(items.len() as i64)),
            Value::Dict(items) => Some(Value::Int(items.len() as i64)),
            _ => None,
        },
        _ => None,
    }
}

fn method_call(receiver: &Value, method: &str, args: &Arguments) -> Option<Value> {
    let pos = args.positional.as_slice();
    match (receiver, method) {
        (Value::Dict(_), "get") => match pos {
            [key] => Some(receiver.dict_get(key).cloned().unwrap_or(Value::None)),
            [key, default] => Some(receiver.dict_get(key).cloned().unwrap_or_else(|| default.clone())),
            _ => None,
        },
        (Value::Str(s), "format") => str_format(s, pos, &args.keywords).map(Value::Str),
        (Value::Str(_), _) if !args.keywords.is_empty() => None,
        (Value::Str(s), "upper") if pos.is_empty() => Some(Value::Str(s.to_uppercase())),
        (Value::Str(s), "lower") if pos.is_empty() => Some(Value::Str(s.to_lowercase())),
        (Value::Str(s), "strip") if pos.is_empty() => Some(Value::Str(s.trim().to_string())),
        (Value::Str(s), "lstrip") if pos.is_empty() => Some(Value::Str(s.trim_start().to_string())),
        (Value::Str(s), "rstrip") if pos.is_empty() => Some(Value::Str(s.trim_end().to_string())),
        (Value::Str(s), "capitalize") if pos.is_empty() => {
            let mut chars = s.chars();
            Some(Value::Str(match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }))
        }
        (Value::Str(s), "title") if pos.is_empty() => Some(Value::Str(title_case(s))),
        (Value::Str(s), "replace") => match pos {
            [Value::Str(old), Value::Str(new)] => Some(Value::Str(s.replace(old.as_str(), new))),
            _ => None,
        },
        (Value::Str(s), "join") => match pos {
            [Value::List(items) | Value::Tuple(items)] => {
                let parts: Option<Vec<&str>> = items.iter().map(Value::as_str).collect();
                parts.map(|p| Value::Str(p.join(s)))
            }
            _ => None,
        },
        (Value::Str(s), "startswith") => match pos {
            [Value::Str(prefix)] => Some(Value::Bool(s.starts_with(prefix.as_str()))),
            _ => None,
        },
        (Value::Str(s), "endswith") => match pos {
            [Value::Str(suffix)] => Some(Value::Bool(s.ends_with(suffix.as_str()))),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

fn parse_int(text: &str) -> Option<Value> {
    let clean: String = text.chars().filter(|c| *c != '_').collect();
    let lower = clean.to_ascii_lowercase();
    if lower.ends_with('j') || lower.ends_with('l') {
        return None;
    }
    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()
    } else {
        lower.parse().ok()
    };
    parsed.map(Value::Int)
}

fn parse_float(text: &str) -> Option<Value> {
    let clean: String = text.chars().filter(|c| *c != '_').collect();
    if clean.ends_with(['j', 'J']) {
        return None;
    }
    clean.parse().ok().map(Value::Float)
}

fn eval_string(tree: &SyntaxTree, node: Node<'_>, scope: &EvalScope<'_>) -> Result<Value, EvalError> {
    if node.kind() != "string" {
        return eval_expr(tree, node, scope);
    }
    let mut prefix = String::new();
    let mut out = String::new();
    let mut unknown = false;
    for child in named_children(node) {
        match child.kind() {
            "string_start" => {
                prefix = tree
                    .text(child)
                    .chars()
                    .take_while(|c| c.is_ascii_alphabetic())
                    .collect::<String>()
                    .to_ascii_lowercase();
                if prefix.contains('b') {
                    return Err(unsupported(tree, node));
                }
            }
            "string_content" => {
                let raw = tree.text(child);
                let text = if prefix.contains('r') {
                    raw.to_string()
                } else {
                    unescape(raw)
                };
                if prefix.contains('f') {
                    out.push_str(&text.replace("{{", "{").replace("}}", "}"));
                } else {
                    out.push_str(&text);
                }
            }
            "interpolation" => {
                let expression = field(tree, child, "expression")?;
                let mut value = eval_expr(tree, expression, scope)?;
                if value.is_unknown() {
                    unknown = true;
                    continue;
                }
                if let Some(conversion) = child.child_by_field_name("type_conversion") {
                    match tree.text(conversion).trim_start_matches('!') {
                        "r" | "a" => value = Value::Str(value.py_repr()),
                        _ => value = Value::Str(value.py_str()),
                    }
                }
                let spec = child
                    .child_by_field_name("format_specifier")
                    .map(|s| tree.text(s).trim_start_matches(':').to_string())
                    .unwrap_or_default();
                let rendered = apply_format_spec(&value, &spec).ok_or_else(|| unsupported(tree, child))?;
                out.push_str(&rendered);
            }
            _ => {}
        }
    }
    Ok(if unknown { Value::Unknown } else { Value::Str(out) })
}

/// Process backslash escapes of a non-raw string body.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = (0..width).filter_map(|_| chars.next_if(|c| c.is_ascii_hexdigit())).collect();
                match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if digits.len() == width => out.push(decoded),
                    _ => {
                        out.push('\\');
                        out.push(next);
                        out.push_str(&digits);
                    }
                }
            }
            '0'..='7' => {
                let mut digits = next.to_string();
                while digits.len() < 3 {
                    match chars.next_if(|c| ('0'..='7').contains(c)) {
                        Some(d) => digits.push(d),
                        None => break,
                    }
                }
                match u32::from_str_radix(&digits, 8).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => out.push_str(&digits),
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::parse_source;

    fn eval_with(source: &str, locals: &FxHashMap<String, Value>) -> Result<Value, EvalError> {
        let tree = parse_source(source, "<test>").unwrap();
        let stmt = named_children(tree.root()).next().unwrap();
        let expr = named_children(stmt).next().unwrap();
        eval_expr(&tree, expr, &EvalScope::literal(locals))
    }

    fn eval(source: &str) -> Result<Value, EvalError> {
        eval_with(source, &FxHashMap::default())
    }

    #[test]
    fn literals() {
        assert_eq!(eval("404").unwrap(), Value::Int(404));
        assert_eq!(eval("0x1F").unwrap(), Value::Int(31));
        assert_eq!(eval("1_000").unwrap(), Value::Int(1000));
        assert_eq!(eval("-2.5").unwrap(), Value::Float(-2.5));
        assert_eq!(eval("None").unwrap(), Value::None);
        assert_eq!(eval("'Item not found.'").unwrap(), Value::Str("Item not found.".into()));
        assert_eq!(eval(r#""tab\there""#).unwrap(), Value::Str("tab\there".into()));
        assert_eq!(eval(r#"r"raw\n""#).unwrap(), Value::Str("raw\\n".into()));
        assert_eq!(eval("'a' 'b'").unwrap(), Value::Str("ab".into()));
    }

    #[test]
    fn containers_and_operators() {
        assert_eq!(
            eval("{'obj': 'User', 'n': 400 + 4}").unwrap(),
            Value::Dict(vec![
                (Value::Str("obj".into()), Value::Str("User".into())),
                (Value::Str("n".into()), Value::Int(404)),
            ])
        );
        assert_eq!(eval("(1, 2)[-1]").unwrap(), Value::Int(2));
        assert_eq!(eval("'Not ' + 'found'").unwrap(), Value::Str("Not found".into()));
        assert_eq!(eval("None or 'default'").unwrap(), Value::Str("default".into()));
        assert_eq!(eval("'a' if 1 < 2 else 'b'").unwrap(), Value::Str("a".into()));
        assert!(matches!(eval("'a' + 1"), Err(EvalError::TypeMismatch { .. })));
    }

    #[test]
    fn integer_edges_do_not_overflow() {
        assert_eq!(eval("-7 // 2").unwrap(), Value::Int(-4));
        assert_eq!(eval("7 // -2").unwrap(), Value::Int(-4));
        assert_eq!(eval("-7 % 3").unwrap(), Value::Int(2));
        assert_eq!(eval("7 % -3").unwrap(), Value::Int(-2));
        assert_eq!(eval("'ab' * 3").unwrap(), Value::Str("ababab".into()));
        assert_eq!(eval("2 * 'x'").unwrap(), Value::Str("xx".into()));
        assert_eq!(eval("'ab' * -1").unwrap(), Value::Str(String::new()));
        assert!(matches!(eval("'ab' * 9223372036854775807"), Err(EvalError::Unsupported { .. })));
        assert!(matches!(
            eval("(-9223372036854775807 - 1) // -1"),
            Err(EvalError::Unsupported { .. })
        ));
        assert_eq!(eval("(-9223372036854775807 - 1) % -1").unwrap(), Value::Int(0));
        assert!(matches!(eval("f'{1:>999999999999}'"), Err(EvalError::Unsupported { .. })));
    }

    #[test]
    fn fstrings_and_locals() {
        let mut locals = FxHashMap::default();
        locals.insert("obj".to_string(), Value::Str("User".into()));
        locals.insert("code".to_string(), Value::Int(7));
        assert_eq!(
            eval_with("f'{obj} creation failed {{{code:03d}}}'", &locals).unwrap(),
            Value::Str("User creation failed {007}".into())
        );
        assert_eq!(
            eval_with("'{} #{}'.format(obj, code)", &locals).unwrap(),
            Value::Str("User #7".into())
        );
        assert_eq!(
            eval_with("str(code).upper()", &locals).unwrap(),
            Value::Str("7".into())
        );
    }

    #[test]
    fn unresolved_names_are_reported() {
        assert_eq!(
            eval("item_id"),
            Err(EvalError::UnresolvedName {
                name: "item_id".into()
            })
        );
        assert!(matches!(
            eval("f'Item {item_id} missing'"),
            Err(EvalError::UnresolvedName { .. })
        ));
    }

    #[test]
    fn unsupported_syntax_is_an_error() {
        assert!(matches!(
            eval("[x for x in (1, 2)]"),
            Err(EvalError::Unsupported { .. })
        ));
        assert!(matches!(eval("lambda: 1"), Err(EvalError::Unsupported { .. })));
    }
}
