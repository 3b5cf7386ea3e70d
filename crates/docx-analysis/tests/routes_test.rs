//! Route table reconstruction.

mod common;

use common::{load_fixture, names, route};
use docx_analysis::{extract_routes, Project};

#[test]
fn test_routes_follow_includes_and_prefixes() {
    let (project, routes) = load_fixture("routes");

    let table: Vec<(&str, &str, Vec<&str>, bool)> = routes
        .iter()
        .map(|r| {
            (
                r.name.as_str(),
                r.path.as_str(),
                r.methods.iter().map(String::as_str).collect(),
                r.include_in_schema,
            )
        })
        .collect();
    assert_eq!(
        table,
        vec![
            ("health", "/health", vec!["GET"], true),
            ("legacy", "/legacy", vec!["GET", "POST"], false),
            ("metrics", "/metrics", vec!["GET"], true),
            ("list_items", "/items/", vec!["GET"], true),
            ("read_item", "/items/{item_id}", vec!["GET"], true),
            ("drop_item", "/items/{item_id}", vec!["DELETE"], false),
            ("create-user", "/users", vec!["POST"], true),
            ("me", "/users/me", vec!["GET", "PATCH"], true),
            ("stats", "/admin/stats", vec!["GET"], false),
        ]
    );

    let read_item = route(&routes, "read_item");
    assert_eq!(project.function(read_item.endpoint).name, "read_item");
}

#[test]
fn test_unmounted_routers_are_not_documented_when_an_app_exists() {
    let (_, routes) = load_fixture("routes");
    assert!(!names(&routes).contains(&"never_mounted"));
}

#[test]
fn test_router_only_project_uses_top_level_routers() {
    let project = Project::from_sources([
        (
            "api.__init__",
            "from fastapi import APIRouter\n\
             from api.v1 import router as v1\n\
             root = APIRouter(prefix='/api')\n\
             root.include_router(v1, prefix='/v1')\n",
        ),
        (
            "api.v1",
            "from fastapi import APIRouter\n\
             router = APIRouter()\n\
             @router.put('/things/{id}')\n\
             def put_thing(id: int):\n    return id\n",
        ),
    ])
    .unwrap();
    let routes = extract_routes(&project);
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].path, "/api/v1/things/{id}");
    assert_eq!(routes[0].methods, vec!["PUT"]);
}

#[test]
fn test_router_cycle_is_cut() {
    let project = Project::from_sources([(
        "app",
        "from fastapi import APIRouter, FastAPI\n\
         app = FastAPI()\n\
         a = APIRouter(prefix='/a')\n\
         b = APIRouter(prefix='/b')\n\
         @b.get('/x')\n\
         def x():\n    return 1\n\
         a.include_router(b)\n\
         b.include_router(a)\n\
         app.include_router(a)\n",
    )])
    .unwrap();
    let routes = extract_routes(&project);
    assert_eq!(names(&routes), vec!["x"]);
    assert_eq!(routes[0].path, "/a/b/x");
}

#[test]
fn test_route_serializes_without_endpoint() {
    let (_, routes) = load_fixture("single");
    let json = serde_json::to_value(route(&routes, "get_item")).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "name": "get_item",
            "path": "/{item_id}",
            "methods": ["GET"],
            "include_in_schema": true
        })
    );
}

#[test]
fn test_modules_with_syntax_errors_keep_their_valid_routes() {
    let project = Project::from_sources([(
        "app",
        "from fastapi import FastAPI\n\
         app = FastAPI()\n\
         @app.get('/ok')\n\
         def ok():\n    return 1\n\
         def broken(:\n    pass\n",
    )])
    .unwrap();
    let module = project.module(project.module_id("app").unwrap());
    assert_eq!(module.syntax_errors.first().map(|r| r.start.line), Some(5));

    let routes = extract_routes(&project);
    assert_eq!(names(&routes), vec!["ok"]);
}

const INTERLEAVED: &str = "from fastapi import APIRouter, FastAPI, HTTPException\n\
app = FastAPI()\n\
sub = APIRouter()\n\
@sub.get('/dup')\n\
def from_sub():\n    raise HTTPException(409, 'from sub')\n\
app.include_router(sub)\n\
@app.get('/dup')\n\
def from_app():\n    raise HTTPException(409, 'from app')\n\
@app.get('/outer')\n\
@app.get('/inner')\n\
def stacked():\n    return 3\n";

#[test]
fn test_registration_follows_source_order() {
    let project = Project::from_sources([("app", INTERLEAVED)]).unwrap();
    let routes = extract_routes(&project);
    let table: Vec<(&str, &str)> = routes.iter().map(|r| (r.name.as_str(), r.path.as_str())).collect();
    assert_eq!(
        table,
        vec![
            ("from_sub", "/dup"),
            ("from_app", "/dup"),
            ("stacked", "/inner"),
            ("stacked", "/outer"),
        ]
    );
}
