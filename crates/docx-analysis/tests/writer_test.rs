//! Interface document writer.

use docx_analysis::model::{FunctionRef, ModuleId};
use docx_analysis::openapi::{
    add_model_to_openapi, http_exception_schema, write_response, CustomErrorDoc, ErrorSchema,
    HTTP_EXCEPTION_SCHEMA,
};
use docx_analysis::{ErrorInstance, Route};
use docx_core::errors::DocumentError;
use proptest::prelude::*;
use serde_json::{json, Map, Value as Json};

fn route(path: &str, methods: &[&str]) -> Route {
    Route {
        name: "handler".to_string(),
        path: path.to_string(),
        methods: methods.iter().map(|m| m.to_string()).collect(),
        include_in_schema: true,
        endpoint: FunctionRef {
            module: ModuleId(0),
            index: 0,
        },
    }
}

fn http_error(status_code: u16, detail: Option<&str>) -> ErrorInstance {
    ErrorInstance {
        class_name: "HTTPException".to_string(),
        qualname: "fastapi.exceptions:HTTPException".to_string(),
        lineage: vec![
            "fastapi.exceptions:HTTPException".to_string(),
            "starlette.exceptions:HTTPException".to_string(),
            "builtins:Exception".to_string(),
            "builtins:BaseException".to_string(),
            "builtins:object".to_string(),
        ],
        status_code,
        detail: detail.map(str::to_string),
    }
}

fn app_error(class_name: &str, status_code: u16) -> ErrorInstance {
    ErrorInstance {
        class_name: class_name.to_string(),
        qualname: format!("app.errors:{class_name}"),
        lineage: vec![
            format!("app.errors:{class_name}"),
            "app.errors:AppError".to_string(),
            "builtins:Exception".to_string(),
            "builtins:BaseException".to_string(),
            "builtins:object".to_string(),
        ],
        status_code,
        detail: Some("ignored for custom errors".to_string()),
    }
}

fn document() -> Json {
    json!({
        "openapi": "3.1.0",
        "info": {"title": "FastAPI", "version": "0.1.0"},
        "paths": {
            "/items/{item_id}": {
                "get": {
                    "responses": {
                        "200": {"description": "Successful Response"}
                    }
                },
                "delete": {}
            }
        }
    })
}

fn content_ref(document: &Json, method: &str, code: &str) -> Json {
    document["paths"]["/items/{item_id}"][method]["responses"][code]["content"]["application/json"]["schema"]["$ref"]
        .clone()
}

#[test]
fn test_writes_under_every_method() {
    let mut doc = document();
    let route = route("/items/{item_id}", &["GET", "DELETE"]);
    let written = write_response(&mut doc, &route, &http_error(404, Some("Item not found.")), None, HTTP_EXCEPTION_SCHEMA).unwrap();
    assert_eq!(written, 2);
    for method in ["get", "delete"] {
        let response = &doc["paths"]["/items/{item_id}"][method]["responses"]["404"];
        assert_eq!(response["description"], "Item not found.");
        assert_eq!(content_ref(&doc, method, "404"), "#/components/schemas/HTTPExceptionSchema");
    }
    assert_eq!(
        doc["paths"]["/items/{item_id}"]["get"]["responses"]["200"],
        json!({"description": "Successful Response"})
    );
}

#[test]
fn test_first_write_wins() {
    let mut doc = document();
    let route = route("/items/{item_id}", &["GET"]);
    write_response(&mut doc, &route, &http_error(409, Some("first")), None, HTTP_EXCEPTION_SCHEMA).unwrap();
    let written = write_response(&mut doc, &route, &http_error(409, Some("second")), None, HTTP_EXCEPTION_SCHEMA).unwrap();
    assert_eq!(written, 0);
    assert_eq!(doc["paths"]["/items/{item_id}"]["get"]["responses"]["409"]["description"], "first");

    // Framework-generated entries are never replaced either.
    let written = write_response(&mut doc, &route, &http_error(200, Some("raised")), None, HTTP_EXCEPTION_SCHEMA).unwrap();
    assert_eq!(written, 0);
}

#[test]
fn test_description_falls_back_to_class_name() {
    let mut doc = document();
    let route = route("/items/{item_id}", &["GET"]);
    write_response(&mut doc, &route, &http_error(599, None), None, HTTP_EXCEPTION_SCHEMA).unwrap();
    assert_eq!(doc["paths"]["/items/{item_id}"]["get"]["responses"]["599"]["description"], "HTTPException");
}

#[test]
fn test_custom_errors_use_custom_schema() {
    let mut doc = document();
    let route = route("/items/{item_id}", &["GET"]);
    let custom = CustomErrorDoc {
        class: "app.errors:AppError".to_string(),
        schema: "AppErrorSchema".to_string(),
    };
    write_response(&mut doc, &route, &app_error("NotReady", 425), Some(&custom), HTTP_EXCEPTION_SCHEMA).unwrap();
    write_response(&mut doc, &route, &http_error(400, Some("Bad")), Some(&custom), HTTP_EXCEPTION_SCHEMA).unwrap();

    let responses = &doc["paths"]["/items/{item_id}"]["get"]["responses"];
    assert_eq!(responses["425"]["description"], "NotReady");
    assert_eq!(content_ref(&doc, "get", "425"), "#/components/schemas/AppErrorSchema");
    assert_eq!(responses["400"]["description"], "Bad");
    assert_eq!(content_ref(&doc, "get", "400"), "#/components/schemas/HTTPExceptionSchema");
}

#[test]
fn test_configured_http_schema_name() {
    let mut doc = document();
    let route = route("/items/{item_id}", &["GET"]);
    write_response(&mut doc, &route, &http_error(400, Some("Bad")), None, "ErrorOut").unwrap();
    assert_eq!(content_ref(&doc, "get", "400"), "#/components/schemas/ErrorOut");
}

#[test]
fn test_missing_operations_are_skipped() {
    let mut doc = document();
    let before = doc.clone();
    assert_eq!(
        write_response(&mut doc, &route("/nowhere", &["GET"]), &http_error(404, None), None, HTTP_EXCEPTION_SCHEMA).unwrap(),
        0
    );
    assert_eq!(
        write_response(&mut doc, &route("/items/{item_id}", &["PUT"]), &http_error(404, None), None, HTTP_EXCEPTION_SCHEMA)
            .unwrap(),
        0
    );
    assert_eq!(doc, before);

    let mut no_paths = json!({"openapi": "3.1.0"});
    assert_eq!(
        write_response(&mut no_paths, &route("/", &["GET"]), &http_error(404, None), None, HTTP_EXCEPTION_SCHEMA).unwrap(),
        0
    );
}

#[test]
fn test_malformed_document_is_an_error() {
    let mut doc = json!({"paths": {"/items/{item_id}": {"get": {"responses": "nope"}}}});
    let err = write_response(
        &mut doc,
        &route("/items/{item_id}", &["GET"]),
        &http_error(404, None),
        None,
        HTTP_EXCEPTION_SCHEMA,
    )
    .unwrap_err();
    match err {
        DocumentError::NotAnObject { pointer } => assert_eq!(pointer, "/paths/~1items~1{item_id}/get/responses"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_add_model_creates_components() {
    let mut doc = json!({"openapi": "3.1.0"});
    add_model_to_openapi(&mut doc, &http_exception_schema()).unwrap();
    assert_eq!(
        doc["components"]["schemas"]["HTTPExceptionSchema"],
        json!({
            "properties": {
                "detail": {
                    "anyOf": [{"type": "string"}, {"type": "null"}],
                    "default": null,
                    "title": "Detail"
                }
            },
            "title": "HTTPExceptionSchema",
            "type": "object"
        })
    );

    let mut schema = Map::new();
    schema.insert("description".to_string(), json!("Shown.\n\u{c}\nHidden."));
    schema.insert("type".to_string(), json!("object"));
    add_model_to_openapi(
        &mut doc,
        &ErrorSchema {
            name: "Described".to_string(),
            schema,
        },
    )
    .unwrap();
    assert_eq!(doc["components"]["schemas"]["Described"]["description"], "Shown.\n");
    assert!(doc["components"]["schemas"]["HTTPExceptionSchema"].is_object());

    let mut bad = json!({"components": []});
    assert!(matches!(
        add_model_to_openapi(&mut bad, &http_exception_schema()),
        Err(DocumentError::NotAnObject { .. })
    ));
}

proptest! {
    /// Writing an error a second time changes nothing, whatever its code.
    #[test]
    fn prop_write_is_idempotent(code in 100u16..600, detail in "[a-zA-Z ]{0,20}") {
        let mut doc = document();
        let route = route("/items/{item_id}", &["GET", "DELETE"]);
        let error = http_error(code, Some(&detail));
        write_response(&mut doc, &route, &error, None, HTTP_EXCEPTION_SCHEMA).unwrap();
        let once = doc.clone();
        let written = write_response(&mut doc, &route, &error, None, HTTP_EXCEPTION_SCHEMA).unwrap();
        prop_assert_eq!(written, 0);
        prop_assert_eq!(doc, once);
    }
}
