//! JSON schema derivation for pydantic-style model classes.
//!
//! Fields are the annotated names of the class body, parents first. The
//! output mirrors the serialization schema pydantic emits: sorted keys,
//! `anyOf` for unions, titles derived from field names.

use std::collections::BTreeMap;

use docx_core::errors::ParseError;
use rustc_hash::FxHashMap;
use serde_json::{json, Map, Value as Json};
use tree_sitter::Node;

use super::schema::{schema_ref, ErrorSchema};
use crate::eval::literal::title_case;
use crate::eval::{eval_lenient, EvalScope, Value};
use crate::model::{ClassRef, Field, ModuleId};
use crate::parsers::{parse_source, SyntaxTree};
use crate::query::{dotted_parts, named_children};
use crate::resolver::{Object, Resolver};

/// Schema of `class`, named after it.
pub fn model_schema(resolver: &dyn Resolver, class: ClassRef) -> Result<ErrorSchema, ParseError> {
    let def = resolver.class_def(class);
    let mut fields: Vec<(Field, ModuleId)> = Vec::new();
    for ancestor in resolver.lineage(class).into_iter().rev() {
        let ancestor_def = resolver.class_def(ancestor);
        for field in &ancestor_def.fields {
            if field.name.starts_with('_') || field.annotation.contains("ClassVar") {
                continue;
            }
            let entry = (field.clone(), ancestor_def.module);
            match fields.iter_mut().find(|(f, _)| f.name == field.name) {
                Some(slot) => *slot = entry,
                None => fields.push(entry),
            }
        }
    }

    let mut properties = Map::new();
    let mut required = Vec::new();
    for (field, module) in &fields {
        let mut property = annotation_schema(resolver, *module, &field.annotation)?;
        match &field.default {
            None => required.push(Json::from(field.name.clone())),
            Some(default) => {
                if let Some(default) = default.to_json() {
                    property.insert("default".to_string(), default);
                }
            }
        }
        property.insert(
            "title".to_string(),
            Json::from(title_case(&field.name.replace('_', " "))),
        );
        properties.insert(field.name.clone(), Json::Object(sorted(property)));
    }

    let mut schema = BTreeMap::new();
    if let Some(doc) = def.doc.as_deref().map(clean_doc).filter(|d| !d.is_empty()) {
        schema.insert("description", Json::from(doc));
    }
    schema.insert("properties", Json::Object(properties));
    if !required.is_empty() {
        schema.insert("required", Json::Array(required));
    }
    schema.insert("title", Json::from(def.name.clone()));
    schema.insert("type", json!("object"));
    Ok(ErrorSchema {
        name: def.name.clone(),
        schema: schema.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
    })
}

fn sorted(map: Map<String, Json>) -> Map<String, Json> {
    let ordered: BTreeMap<String, Json> = map.into_iter().collect();
    ordered.into_iter().collect()
}

/// `inspect.cleandoc`: first line stripped, the common margin of the
/// rest removed, blank lines trimmed at both ends.
fn clean_doc(doc: &str) -> String {
    let lines: Vec<&str> = doc.lines().collect();
    let leading = |line: &str| line.len() - line.trim_start().len();
    let margin = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim_start().is_empty())
        .map(|l| leading(l))
        .min()
        .unwrap_or(0);
    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    if let Some(first) = lines.first() {
        cleaned.push(first.trim_start().to_string());
    }
    for line in lines.iter().skip(1) {
        let cut = margin.min(leading(line));
        cleaned.push(line.get(cut..).unwrap_or(line).to_string());
    }
    while cleaned.first().is_some_and(|l| l.is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.is_empty()) {
        cleaned.pop();
    }
    cleaned.join("\n")
}

fn annotation_schema(resolver: &dyn Resolver, module: ModuleId, annotation: &str) -> Result<Map<String, Json>, ParseError> {
    let tree = parse_source(annotation, "<annotation>")?;
    let expr = named_children(tree.root())
        .next()
        .and_then(|stmt| named_children(stmt).next());
    Ok(match expr {
        Some(expr) => Annotation { resolver, module, tree: &tree }.schema(expr),
        None => Map::new(),
    })
}

struct Annotation<'a> {
    resolver: &'a dyn Resolver,
    module: ModuleId,
    tree: &'a SyntaxTree,
}

fn typed(kind: &str) -> Map<String, Json> {
    let mut map = Map::new();
    map.insert("type".to_string(), Json::from(kind));
    map
}

impl Annotation<'_> {
    fn schema(&self, node: Node<'_>) -> Map<String, Json> {
        match node.kind() {
            "none" => typed("null"),
            "identifier" | "attribute" => match dotted_parts(self.tree, node) {
                Some(parts) => self.named(&parts),
                None => Map::new(),
            },
            "binary_operator" => {
                let mut members = Vec::new();
                self.union_members(node, &mut members);
                union(members)
            }
            "subscript" => self.generic(node),
            _ => Map::new(),
        }
    }

    fn union_members(&self, node: Node<'_>, out: &mut Vec<Map<String, Json>>) {
        let is_union = node.kind() == "binary_operator"
            && node
                .child_by_field_name("operator")
                .is_some_and(|op| self.tree.text(op) == "|");
        if !is_union {
            out.push(self.schema(node));
            return;
        }
        for side in ["left", "right"] {
            if let Some(side) = node.child_by_field_name(side) {
                self.union_members(side, out);
            }
        }
    }

    fn named(&self, parts: &[String]) -> Map<String, Json> {
        let Some(last) = parts.last() else {
            return Map::new();
        };
        match last.as_str() {
            "str" => typed("string"),
            "int" => typed("integer"),
            "float" => typed("number"),
            "bool" => typed("boolean"),
            "None" | "NoneType" => typed("null"),
            "dict" | "Dict" | "Mapping" => typed("object"),
            "list" | "List" | "Sequence" | "tuple" | "Tuple" | "set" | "Set" => {
                let mut map = Map::new();
                map.insert("items".to_string(), json!({}));
                map.insert("type".to_string(), json!("array"));
                map
            }
            "Any" | "object" => Map::new(),
            _ => match self.resolver.resolve_path(self.module, parts) {
                Some(Object::Class(class)) => {
                    let mut map = Map::new();
                    map.insert(
                        "$ref".to_string(),
                        Json::from(schema_ref(&self.resolver.class_def(class).name)),
                    );
                    map
                }
                _ => Map::new(),
            },
        }
    }

    fn generic(&self, node: Node<'_>) -> Map<String, Json> {
        let Some(base) = node
            .child_by_field_name("value")
            .and_then(|v| dotted_parts(self.tree, v))
        else {
            return Map::new();
        };
        let mut cursor = node.walk();
        let args: Vec<Node<'_>> = node.children_by_field_name("subscript", &mut cursor).collect();
        let base = base.last().map(String::as_str).unwrap_or_default();
        match base {
            "Optional" => {
                let mut members: Vec<_> = args.iter().map(|a| self.schema(*a)).collect();
                members.push(typed("null"));
                union(members)
            }
            "Union" => union(args.iter().map(|a| self.schema(*a)).collect()),
            "Annotated" => args.first().map(|a| self.schema(*a)).unwrap_or_default(),
            "list" | "List" | "Sequence" | "set" | "Set" | "frozenset" | "tuple" | "Tuple" => {
                let mut map = Map::new();
                let items = args.first().map(|a| self.schema(*a)).unwrap_or_default();
                map.insert("items".to_string(), Json::Object(items));
                map.insert("type".to_string(), json!("array"));
                if matches!(base, "set" | "Set" | "frozenset") {
                    map.insert("uniqueItems".to_string(), json!(true));
                }
                sorted(map)
            }
            "dict" | "Dict" | "Mapping" => {
                let mut map = Map::new();
                if let Some(value) = args.get(1) {
                    map.insert("additionalProperties".to_string(), Json::Object(self.schema(*value)));
                }
                map.insert("type".to_string(), json!("object"));
                map
            }
            "Literal" => {
                let empty = FxHashMap::default();
                let values: Vec<Json> = args
                    .iter()
                    .map(|a| eval_lenient(self.tree, *a, &EvalScope::literal(&empty)))
                    .filter_map(|v: Value| v.to_json())
                    .collect();
                let mut map = Map::new();
                map.insert("enum".to_string(), Json::Array(values));
                map
            }
            _ => self.named(&[base.to_string()]),
        }
    }
}

/// `anyOf`, flattened and deduplicated; a single member stands alone.
fn union(members: Vec<Map<String, Json>>) -> Map<String, Json> {
    let mut flat: Vec<Json> = Vec::new();
    for member in members {
        let nested = match member.get("anyOf") {
            Some(Json::Array(items)) if member.len() == 1 => items.clone(),
            _ => vec![Json::Object(member)],
        };
        for item in nested {
            if !flat.contains(&item) {
                flat.push(item);
            }
        }
    }
    if flat.len() == 1 {
        if let Some(Json::Object(only)) = flat.pop() {
            return only;
        }
        return Map::new();
    }
    let mut map = Map::new();
    map.insert("anyOf".to_string(), Json::Array(flat));
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Project;

    #[test]
    fn derives_pydantic_shaped_schema() {
        let project = Project::from_sources([(
            "app.schemas",
            "from pydantic import BaseModel\n\
             class Base(BaseModel):\n    code: int\n\
             class CustomErrorSchema(Base):\n    \
                 \"\"\"Error payload.\n\n    \\f\n    internal\n    \"\"\"\n    \
                 error_type: str\n    detail: str | None = None\n    tags: list[str] = []\n",
        )])
        .unwrap();
        let module = project.module_id("app.schemas").unwrap();
        let Some(Object::Class(class)) = project.resolve_in_module(module, "CustomErrorSchema") else {
            panic!("class not found");
        };
        let schema = model_schema(&project, class).unwrap();
        assert_eq!(schema.name, "CustomErrorSchema");
        assert_eq!(
            Json::Object(schema.schema),
            json!({
                "description": "Error payload.\n\n\u{c}\ninternal",
                "properties": {
                    "code": {"title": "Code", "type": "integer"},
                    "error_type": {"title": "Error Type", "type": "string"},
                    "detail": {
                        "anyOf": [{"type": "string"}, {"type": "null"}],
                        "default": null,
                        "title": "Detail"
                    },
                    "tags": {"default": [], "items": {"type": "string"}, "title": "Tags", "type": "array"}
                },
                "required": ["code", "error_type"],
                "title": "CustomErrorSchema",
                "type": "object"
            })
        );
    }
}
