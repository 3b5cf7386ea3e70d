//! Shared helpers for the docx-analysis integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use docx_analysis::{extract_routes, ErrorInstance, Project, Route};
use docx_core::config::ClassRef as ClassPath;

pub fn fixture_root(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-fixtures/python")
        .join(name)
}

/// Load a fixture project from `test-fixtures/python/<name>`.
pub fn load_fixture(name: &str) -> (Project, Vec<Route>) {
    let project = Project::load(&fixture_root(name), &[]).unwrap();
    let routes = extract_routes(&project);
    (project, routes)
}

pub fn route<'a>(routes: &'a [Route], name: &str) -> &'a Route {
    routes
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("no route named {name} in {:?}", names(routes)))
}

pub fn names(routes: &[Route]) -> Vec<&str> {
    routes.iter().map(|r| r.name.as_str()).collect()
}

pub fn class_path(raw: &str) -> ClassPath {
    ClassPath::parse("test", raw).unwrap()
}

pub fn codes(errors: &[ErrorInstance]) -> Vec<u16> {
    errors.iter().map(|e| e.status_code).collect()
}

pub fn sorted_codes(errors: &[ErrorInstance]) -> Vec<u16> {
    let mut codes = codes(errors);
    codes.sort_unstable();
    codes
}
