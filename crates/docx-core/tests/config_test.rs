//! Tests for the docx configuration system.

use std::path::PathBuf;
use std::sync::Mutex;

use docx_core::config::{ClassRef, CliOverrides, DocxConfig};
use docx_core::errors::{ConfigError, DocxErrorCode};

/// Global mutex to serialize tests that modify environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn tempdir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

/// Clear all DOCX_ env vars and point HOME at an empty directory so a real
/// user config never leaks into a test.
fn isolate_env(home: &std::path::Path) {
    for key in [
        "DOCX_ROOT",
        "DOCX_OPENAPI",
        "DOCX_OUTPUT",
        "DOCX_CUSTOM_ERROR",
        "DOCX_CUSTOM_ERROR_SCHEMA",
        "DOCX_HTTP_ERROR_SCHEMA",
        "DOCX_DEPENDENCY_CLASSES",
        "DOCX_SERVICE_CLASSES",
    ] {
        std::env::remove_var(key);
    }
    std::env::set_var("HOME", home);
    std::env::remove_var("USERPROFILE");
}

#[test]
fn test_defaults_from_empty_toml() {
    let config = DocxConfig::from_toml("").unwrap();
    assert!(config.errors.custom_error.is_none());
    assert!(config.errors.dependency_classes.is_empty());
    assert_eq!(config.project.effective_openapi(), PathBuf::from("openapi.json"));
    assert_eq!(config.project.effective_output(), PathBuf::from("openapi.json"));
}

#[test]
fn test_layer_resolution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempdir();
    isolate_env(home.path());

    std::fs::create_dir_all(home.path().join(".docx")).unwrap();
    std::fs::write(
        home.path().join(".docx/config.toml"),
        r#"
[project]
output = "user-out.json"

[errors]
service_classes = ["app.services:UserBase"]
"#,
    )
    .unwrap();

    let dir = tempdir();
    std::fs::write(
        dir.path().join("docx.toml"),
        r#"
[project]
openapi = "project.json"

[errors]
custom_error = "app.errors:AppExceptionCase"
dependency_classes = ["app.deps:AppDeps"]
"#,
    )
    .unwrap();

    std::env::set_var("DOCX_SERVICE_CLASSES", "app.services:AppService, app.services:Other");

    let cli = CliOverrides {
        openapi: Some(PathBuf::from("cli.json")),
        ..Default::default()
    };
    let config = DocxConfig::load(dir.path(), Some(&cli)).unwrap();

    // CLI beats project
    assert_eq!(config.project.effective_openapi(), PathBuf::from("cli.json"));
    // user config survives where nothing overrides it
    assert_eq!(config.project.effective_output(), PathBuf::from("user-out.json"));
    // project
    assert_eq!(
        config.errors.custom_error.as_deref(),
        Some("app.errors:AppExceptionCase")
    );
    // env beats user
    assert_eq!(
        config.errors.service_classes,
        vec!["app.services:AppService", "app.services:Other"]
    );

    std::env::remove_var("DOCX_SERVICE_CLASSES");
}

#[test]
fn test_load_missing_files_falls_back_to_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempdir();
    isolate_env(home.path());

    let dir = tempdir();
    let config = DocxConfig::load(dir.path(), None).unwrap();
    assert!(config.errors.custom_error.is_none());
    assert!(config.project.extra_ignore.is_empty());
}

#[test]
fn test_invalid_project_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempdir();
    isolate_env(home.path());

    let dir = tempdir();
    std::fs::write(dir.path().join("docx.toml"), "[errors\ncustom_error = ").unwrap();
    let err = DocxConfig::load(dir.path(), None).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
    assert_eq!(err.error_code(), "CONFIG_ERROR");
    assert!(err.coded_string().starts_with("[CONFIG_ERROR] "));
}

#[test]
fn test_custom_schema_requires_custom_error() {
    let config = DocxConfig::from_toml(
        r#"
[errors]
custom_error_schema = "app.schemas:AppErrorSchema"
"#,
    )
    .unwrap();
    let err = DocxConfig::validate(&config).unwrap_err();
    assert!(
        matches!(err, ConfigError::ValidationFailed { ref field, .. } if field == "errors.custom_error_schema")
    );
}

#[test]
fn test_malformed_class_reference_rejected() {
    let config = DocxConfig::from_toml(
        r#"
[errors]
dependency_classes = ["NoModule"]
"#,
    )
    .unwrap();
    let err = DocxConfig::validate(&config).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
fn test_class_reference_forms() {
    let colon = ClassRef::parse("f", "app.errors:AppExc.CreateFailed").unwrap();
    assert_eq!(colon.module, "app.errors");
    assert_eq!(colon.name, "AppExc.CreateFailed");
    assert_eq!(colon.class_name(), "CreateFailed");

    let dotted = ClassRef::parse("f", "app.errors.AppExceptionCase").unwrap();
    assert_eq!(dotted.module, "app.errors");
    assert_eq!(dotted.name, "AppExceptionCase");
    assert_eq!(dotted.to_string(), "app.errors:AppExceptionCase");

    assert!(ClassRef::parse("f", "app.errors:").is_err());
    assert!(ClassRef::parse("f", "app..errors:X").is_err());
    assert!(ClassRef::parse("f", "app.errors:1Bad").is_err());
}

#[test]
fn test_unrecognized_keys_accepted() {
    let config = DocxConfig::from_toml(
        r#"
[project]
root = "src"
future_option = true

[unknown_section]
x = 1
"#,
    )
    .unwrap();
    assert_eq!(
        config.project.effective_root(std::path::Path::new("/repo")),
        PathBuf::from("/repo/src")
    );
}

#[test]
fn test_config_round_trip() {
    let config = DocxConfig::from_toml(
        r#"
[errors]
custom_error = "app.errors:AppExceptionCase"
custom_error_schema = "app.schemas:AppErrorSchema"
service_classes = ["app.services:AppService"]
"#,
    )
    .unwrap();
    let toml_str = config.to_toml().unwrap();
    let round_tripped = DocxConfig::from_toml(&toml_str).unwrap();
    assert_eq!(round_tripped.errors.custom_error, config.errors.custom_error);
    assert_eq!(
        round_tripped.errors.service_classes,
        config.errors.service_classes
    );
    DocxConfig::validate(&round_tripped).unwrap();
}
