//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the docx tracing/logging system.
///
/// Reads the `DOCX_LOG` environment variable for per-module log levels,
/// e.g. `DOCX_LOG=docx_analysis::discovery=trace,docx=info`.
/// Falls back to `docx=info` if `DOCX_LOG` is not set or is invalid.
///
/// Output goes to stderr so the document can be piped from stdout.
/// Idempotent.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("DOCX_LOG")
            .unwrap_or_else(|_| EnvFilter::new("docx=info"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .init();
    });
}
