//! Writes discovered errors into an interface document.

use docx_core::errors::DocumentError;
use serde_json::{json, Map, Value as Json};

use super::schema::{schema_ref, ErrorSchema};
use crate::discovery::ErrorInstance;
use crate::routes::Route;

/// The custom error class and the schema its instances are documented with.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomErrorDoc {
    /// Qualified class name, `module:Qual.Name`.
    pub class: String,
    pub schema: String,
}

fn object_at<'a>(value: &'a mut Json, pointer: &str) -> Result<&'a mut Map<String, Json>, DocumentError> {
    value.as_object_mut().ok_or_else(|| DocumentError::NotAnObject {
        pointer: pointer.to_string(),
    })
}

/// Register `schema` under `components.schemas`, creating the containers.
/// A description is cut at its first form feed.
pub fn add_model_to_openapi(document: &mut Json, schema: &ErrorSchema) -> Result<(), DocumentError> {
    let root = object_at(document, "")?;
    let components = root.entry("components").or_insert_with(|| json!({}));
    let components = object_at(components, "/components")?;
    let schemas = components.entry("schemas").or_insert_with(|| json!({}));
    let schemas = object_at(schemas, "/components/schemas")?;

    let mut body = schema.schema.clone();
    if let Some(Json::String(description)) = body.get_mut("description") {
        if let Some((kept, _)) = description.split_once('\u{c}') {
            *description = kept.to_string();
        }
    }
    schemas.insert(schema.name.clone(), Json::Object(body));
    Ok(())
}

/// Document `error` under every method of `route`, unless a response for
/// its status code is already there. Returns how many entries were added.
pub fn write_response(
    document: &mut Json,
    route: &Route,
    error: &ErrorInstance,
    custom: Option<&CustomErrorDoc>,
    http_schema: &str,
) -> Result<usize, DocumentError> {
    let code = error.status_code.to_string();
    let (description, schema) = match custom {
        Some(custom) if error.is_instance_of(&custom.class) => (error.class_name.clone(), custom.schema.as_str()),
        _ => (
            error.detail.clone().unwrap_or_else(|| error.class_name.clone()),
            http_schema,
        ),
    };

    let root = object_at(document, "")?;
    let Some(paths) = root.get_mut("paths") else {
        tracing::warn!(path = %route.path, "document has no paths, skipping");
        return Ok(0);
    };
    let paths = object_at(paths, "/paths")?;
    let Some(item) = paths.get_mut(&route.path) else {
        tracing::warn!(path = %route.path, "path not in document, skipping");
        return Ok(0);
    };
    let pointer = format!("/paths/{}", escape_pointer(&route.path));
    let item = object_at(item, &pointer)?;

    let mut written = 0;
    for method in &route.methods {
        let method = method.to_ascii_lowercase();
        let Some(operation) = item.get_mut(&method) else {
            tracing::warn!(path = %route.path, %method, "operation not in document, skipping");
            continue;
        };
        let operation = object_at(operation, &format!("{pointer}/{method}"))?;
        let responses = operation.entry("responses").or_insert_with(|| json!({}));
        let responses = object_at(responses, &format!("{pointer}/{method}/responses"))?;
        if responses.contains_key(&code) {
            continue;
        }
        responses.insert(
            code.clone(),
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": {"$ref": schema_ref(schema)}
                    }
                }
            }),
        );
        written += 1;
    }
    Ok(written)
}

/// RFC 6901 escaping for error messages.
fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
