//! Error payload schemas registered under `components.schemas`.

use serde_json::{json, Map, Value as Json};

/// Name of the generic schema for framework HTTP errors.
pub const HTTP_EXCEPTION_SCHEMA: &str = "HTTPExceptionSchema";

/// A named JSON schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorSchema {
    pub name: String,
    pub schema: Map<String, Json>,
}

pub fn schema_ref(name: &str) -> String {
    format!("#/components/schemas/{name}")
}

/// `{detail: string | null = null}`, as the framework's own error model
/// serializes.
pub fn http_exception_schema() -> ErrorSchema {
    let mut schema = Map::new();
    schema.insert(
        "properties".to_string(),
        json!({
            "detail": {
                "anyOf": [{"type": "string"}, {"type": "null"}],
                "default": null,
                "title": "Detail"
            }
        }),
    );
    schema.insert("title".to_string(), json!(HTTP_EXCEPTION_SCHEMA));
    schema.insert("type".to_string(), json!("object"));
    ErrorSchema {
        name: HTTP_EXCEPTION_SCHEMA.to_string(),
        schema,
    }
}
