//! End-to-end generation over the fixture projects.

mod common;

use common::{class_path, load_fixture};
use docx_analysis::openapi::GenerateStats;
use docx_analysis::{extract_routes, generate, DiscoveryOptions, GenerateOptions, Project};
use docx_core::config::DocxConfig;
use docx_core::errors::{DocxErrorCode, GenerateError};
use serde_json::{json, Value as Json};

fn operation() -> Json {
    json!({
        "responses": {
            "200": {
                "description": "Successful Response",
                "content": {"application/json": {"schema": {}}}
            }
        }
    })
}

fn custom_document() -> Json {
    json!({
        "openapi": "3.1.0",
        "info": {"title": "FastAPI", "version": "0.1.0"},
        "paths": {
            "/api/v1/": {"get": operation(), "post": operation()},
            "/api/v1/me": {
                "get": operation(),
                "put": operation(),
                "post": operation(),
                "delete": operation()
            }
        }
    })
}

fn custom_generate_options() -> GenerateOptions {
    let config = DocxConfig::from_toml(
        r#"
        [errors]
        custom_error = "errors:AppExceptionCase"
        custom_error_schema = "errors:AppExceptionSchema"
        dependency_classes = ["dependencies:AppDeps", "dependencies:CallableDep"]
        service_classes = ["services:AppService"]
        "#,
    )
    .unwrap();
    GenerateOptions::from_config(&config.errors).unwrap()
}

fn response<'a>(document: &'a Json, path: &str, method: &str, code: &str) -> &'a Json {
    &document["paths"][path][method]["responses"][code]
}

fn schema_ref(document: &Json, path: &str, method: &str, code: &str) -> String {
    response(document, path, method, code)["content"]["application/json"]["schema"]["$ref"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

fn codes(document: &Json, path: &str, method: &str) -> Vec<String> {
    document["paths"][path][method]["responses"]
        .as_object()
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default()
}

#[test]
fn test_single_route_document() {
    let (project, routes) = load_fixture("single");
    let document = json!({
        "openapi": "3.1.0",
        "info": {"title": "FastAPI", "version": "0.1.0"},
        "paths": {
            "/{item_id}": {"get": operation()},
            "/": {"get": operation()}
        }
    });
    let report = generate(&document, &project, &routes, &GenerateOptions::default()).unwrap();
    let doc = &report.document;

    assert_eq!(codes(doc, "/{item_id}", "get"), vec!["200", "404"]);
    assert_eq!(response(doc, "/{item_id}", "get", "404")["description"], "Item not found.");
    assert_eq!(
        schema_ref(doc, "/{item_id}", "get", "404"),
        "#/components/schemas/HTTPExceptionSchema"
    );
    assert_eq!(codes(doc, "/", "get"), vec!["200"]);
    assert!(doc["components"]["schemas"]["HTTPExceptionSchema"].is_object());
    assert_eq!(
        report.stats,
        GenerateStats {
            routes: 2,
            hidden: 0,
            errors: 1,
            responses: 1,
        }
    );
    // The input is left untouched.
    assert!(document.get("components").is_none());
}

#[test]
fn test_custom_errors_services_and_dependencies() {
    let (project, routes) = load_fixture("custom");
    let report = generate(&custom_document(), &project, &routes, &custom_generate_options()).unwrap();
    let doc = &report.document;

    let schemas = &doc["components"]["schemas"];
    assert!(schemas["HTTPExceptionSchema"].is_object());
    let app_schema = &schemas["AppExceptionSchema"];
    assert_eq!(app_schema["title"], "AppExceptionSchema");
    let description = app_schema["description"].as_str().unwrap();
    assert!(description.starts_with("Application error payload."));
    assert!(!description.contains("Rendered"));
    assert_eq!(
        app_schema["properties"]["exception"]["anyOf"],
        json!([{"type": "string"}, {"type": "null"}])
    );

    // With dependency markers configured, the service class's own
    // `Depends(...)` parameters contribute to every service call.
    assert_eq!(codes(doc, "/api/v1/", "get"), vec!["200", "500", "449", "401", "444", "400"]);
    assert_eq!(response(doc, "/api/v1/", "get", "500")["description"], "CreateFailed");
    assert_eq!(
        schema_ref(doc, "/api/v1/", "get", "500"),
        "#/components/schemas/AppExceptionSchema"
    );
    assert_eq!(response(doc, "/api/v1/", "get", "400")["description"], "Bad request");
    assert_eq!(
        schema_ref(doc, "/api/v1/", "get", "400"),
        "#/components/schemas/HTTPExceptionSchema"
    );

    assert_eq!(
        codes(doc, "/api/v1/", "post"),
        vec!["200", "500", "447", "445", "401", "409", "449", "444", "400"]
    );

    assert_eq!(codes(doc, "/api/v1/me", "get"), vec!["200", "403", "404", "420", "401"]);
    assert_eq!(codes(doc, "/api/v1/me", "put"), vec!["200", "403", "404", "420", "401"]);
    assert_eq!(codes(doc, "/api/v1/me", "post"), vec!["200", "400"]);
    assert_eq!(codes(doc, "/api/v1/me", "delete"), vec!["200", "444", "407"]);

    assert_eq!(report.stats.routes, 6);
    assert_eq!(report.stats.errors, 5 + 10 + 4 + 4 + 1 + 2);
    assert_eq!(report.stats.responses, 5 + 8 + 4 + 4 + 1 + 2);
}

#[test]
fn test_hidden_routes_are_not_documented() {
    let (project, routes) = load_fixture("routes");
    let document = json!({
        "openapi": "3.1.0",
        "paths": {
            "/items/{item_id}": {"get": operation(), "delete": operation()},
            "/users": {"post": operation()}
        }
    });
    let report = generate(&document, &project, &routes, &GenerateOptions::default()).unwrap();
    let doc = &report.document;
    assert_eq!(codes(doc, "/items/{item_id}", "get"), vec!["200", "404"]);
    assert_eq!(response(doc, "/items/{item_id}", "get", "404")["description"], "Not Found");
    assert_eq!(codes(doc, "/items/{item_id}", "delete"), vec!["200"]);
    assert_eq!(response(doc, "/users", "post", "409")["description"], "User exists");
    assert_eq!(report.stats.hidden, 3);
    assert_eq!(report.stats.routes, 6);
}

#[test]
fn test_http_schema_override() {
    let project = Project::from_sources([
        (
            "app.schemas",
            "from pydantic import BaseModel\n\
             class ErrorOut(BaseModel):\n    detail: str\n    code: int = 0\n",
        ),
        (
            "app.main",
            "from fastapi import FastAPI, HTTPException\n\
             app = FastAPI()\n\
             @app.get('/')\n\
             def root():\n    raise HTTPException(status_code=400, detail='bad')\n",
        ),
    ])
    .unwrap();
    let routes = extract_routes(&project);
    let options = GenerateOptions {
        http_error_schema: Some(class_path("app.schemas:ErrorOut")),
        ..GenerateOptions::default()
    };
    let document = json!({"paths": {"/": {"get": operation()}}});
    let report = generate(&document, &project, &routes, &options).unwrap();
    let doc = &report.document;
    assert_eq!(schema_ref(doc, "/", "get", "400"), "#/components/schemas/ErrorOut");
    assert_eq!(doc["components"]["schemas"]["ErrorOut"]["required"], json!(["detail"]));
    assert!(doc["components"]["schemas"].get("HTTPExceptionSchema").is_none());
}

#[test]
fn test_discovery_failure_aborts_generation() {
    let project = Project::from_sources([(
        "app",
        "from fastapi import FastAPI, HTTPException\n\
         app = FastAPI()\n\
         @app.get('/{code}')\n\
         def fail(code: int):\n    raise HTTPException(code)\n",
    )])
    .unwrap();
    let routes = extract_routes(&project);
    let document = json!({"paths": {"/{code}": {"get": operation()}}});
    let err = generate(&document, &project, &routes, &GenerateOptions::default()).unwrap_err();
    assert!(matches!(err, GenerateError::Discovery(_)));
    assert_eq!(err.error_code(), "MATERIALIZE_ERROR");
}

#[test]
fn test_unknown_custom_error_is_reported() {
    let (project, routes) = load_fixture("single");
    let options = GenerateOptions {
        discovery: DiscoveryOptions {
            custom_error: Some(class_path("main:Missing")),
            ..DiscoveryOptions::default()
        },
        ..GenerateOptions::default()
    };
    let err = generate(&json!({"paths": {}}), &project, &routes, &options).unwrap_err();
    assert_eq!(err.error_code(), "UNKNOWN_CLASS");
}

#[test]
fn test_non_object_document_is_rejected() {
    let (project, routes) = load_fixture("single");
    let err = generate(&json!([]), &project, &routes, &GenerateOptions::default()).unwrap_err();
    assert!(matches!(err, GenerateError::Document(_)));
}

#[test]
fn test_project_loaded_from_disk_honours_ignore_files() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("app")).unwrap();
    std::fs::create_dir_all(root.join("scratch")).unwrap();
    std::fs::write(root.join("app/__init__.py"), "").unwrap();
    std::fs::write(
        root.join("app/main.py"),
        "from fastapi import FastAPI\nfrom app.errors import raise_gone\n\
         app = FastAPI()\n\
         @app.get('/old')\n\
         def old():\n    raise_gone()\n",
    )
    .unwrap();
    std::fs::write(
        root.join("app/errors.py"),
        "from fastapi import HTTPException\n\
         def raise_gone():\n    raise HTTPException(410, 'Moved on')\n",
    )
    .unwrap();
    // Not valid Python; must stay out of the scan.
    std::fs::write(root.join("scratch/broken.py"), "def (\n").unwrap();
    std::fs::write(root.join(".docxignore"), "scratch/\n").unwrap();

    let project = Project::load(root, &[]).unwrap();
    assert!(project.module_id("scratch.broken").is_none());
    let routes = extract_routes(&project);
    let report = generate(
        &json!({"paths": {"/old": {"get": operation()}}}),
        &project,
        &routes,
        &GenerateOptions::default(),
    )
    .unwrap();
    assert_eq!(response(&report.document, "/old", "get", "410")["description"], "Moved on");
}

#[test]
fn test_evaluation_failure_aborts_generation() {
    let project = Project::from_sources([(
        "app",
        "from fastapi import FastAPI, HTTPException\n\
         app = FastAPI()\n\
         @app.get('/')\n\
         def read():\n    raise HTTPException(404, detail=lambda: 1)\n",
    )])
    .unwrap();
    let routes = extract_routes(&project);
    let document = json!({"paths": {"/": {"get": operation()}}});
    let err = generate(&document, &project, &routes, &GenerateOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        GenerateError::Discovery(docx_core::errors::DiscoveryError::Evaluation { .. })
    ));
    assert_eq!(err.error_code(), "EVAL_ERROR");
}

#[test]
fn test_class_attribute_errors_are_documented() {
    let (project, routes) = load_fixture("class_attrs");
    let options = GenerateOptions {
        discovery: DiscoveryOptions {
            custom_error: Some(class_path("main:AppError")),
            ..DiscoveryOptions::default()
        },
        ..GenerateOptions::default()
    };
    let document = json!({"paths": {"/items/{item_id}": {"get": operation()}}});
    let report = generate(&document, &project, &routes, &options).unwrap();
    assert_eq!(
        codes(&report.document, "/items/{item_id}", "get"),
        vec!["200", "404", "423", "410", "500"]
    );
}

#[test]
fn test_earlier_registration_wins_a_shared_operation() {
    let project = Project::from_sources([(
        "app",
        "from fastapi import APIRouter, FastAPI, HTTPException\n\
         app = FastAPI()\n\
         sub = APIRouter()\n\
         @sub.get('/dup')\n\
         def from_sub():\n    raise HTTPException(409, 'from sub')\n\
         app.include_router(sub)\n\
         @app.get('/dup')\n\
         def from_app():\n    raise HTTPException(409, 'from app')\n",
    )])
    .unwrap();
    let routes = extract_routes(&project);
    let document = json!({"paths": {"/dup": {"get": operation()}}});
    let report = generate(&document, &project, &routes, &GenerateOptions::default()).unwrap();
    assert_eq!(response(&report.document, "/dup", "get", "409")["description"], "from sub");
}
