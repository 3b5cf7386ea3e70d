//! Reading and writing the interface document.

use std::path::Path;

use docx_core::errors::DocumentError;
use serde_json::Value as Json;

pub fn read(path: &Path) -> Result<Json, DocumentError> {
    let raw = std::fs::read_to_string(path).map_err(|e| DocumentError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let document: Json = serde_json::from_str(&raw).map_err(|e| DocumentError::InvalidJson {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    if !document.is_object() {
        return Err(DocumentError::NotAnObject {
            pointer: String::new(),
        });
    }
    tracing::debug!(path = %path.display(), "document read");
    Ok(document)
}

/// Pretty-printed, with a trailing newline. Key order is preserved.
pub fn write(path: &Path, document: &Json) -> Result<(), DocumentError> {
    let write_error = |message: String| DocumentError::Write {
        path: path.display().to_string(),
        message,
    };
    let mut rendered = serde_json::to_string_pretty(document).map_err(|e| write_error(e.to_string()))?;
    rendered.push('\n');
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
    }
    std::fs::write(path, rendered).map_err(|e| write_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_and_keeps_key_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out/openapi.json");
        let document = json!({"paths": {}, "openapi": "3.1.0", "info": {"title": "x"}});
        write(&path, &document).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.ends_with("}\n"));
        assert!(raw.find("\"paths\"") < raw.find("\"openapi\""));
        assert_eq!(read(&path).unwrap(), document);
    }

    #[test]
    fn rejects_bad_documents() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(read(&missing), Err(DocumentError::Read { .. })));

        let invalid = dir.path().join("invalid.json");
        std::fs::write(&invalid, "{").unwrap();
        assert!(matches!(read(&invalid), Err(DocumentError::InvalidJson { .. })));

        let array = dir.path().join("array.json");
        std::fs::write(&array, "[]").unwrap();
        assert!(matches!(read(&array), Err(DocumentError::NotAnObject { .. })));
    }
}
