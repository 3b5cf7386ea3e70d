//! Tests for tracing initialization.

use std::sync::Mutex;

use docx_core::tracing::init_tracing;

static TRACING_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_init_tracing_idempotent() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    init_tracing();
    init_tracing();
}

#[test]
fn test_invalid_docx_log_falls_back() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var("DOCX_LOG", "not a valid filter ===");
    init_tracing();
    std::env::remove_var("DOCX_LOG");
}
