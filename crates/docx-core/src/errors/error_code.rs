//! DocxErrorCode trait for stable, machine-readable error codes.

/// Trait for mapping docx errors to stable error codes.
/// Every error enum implements this so the CLI can print
/// `[ERROR_CODE] message` and scripts can match on the code.
pub trait DocxErrorCode {
    /// Returns the error code string (e.g., "PARSE_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted error string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const PARSE_ERROR: &str = "PARSE_ERROR";
pub const GRAMMAR_ERROR: &str = "GRAMMAR_ERROR";
pub const PROJECT_ERROR: &str = "PROJECT_ERROR";
pub const DUPLICATE_MODULE: &str = "DUPLICATE_MODULE";
pub const UNRESOLVED_NAME: &str = "UNRESOLVED_NAME";
pub const EVAL_ERROR: &str = "EVAL_ERROR";
pub const CONSTRUCTION_ERROR: &str = "CONSTRUCTION_ERROR";
pub const MISSING_OWNER: &str = "MISSING_OWNER";
pub const UNKNOWN_CLASS: &str = "UNKNOWN_CLASS";
pub const MATERIALIZE_ERROR: &str = "MATERIALIZE_ERROR";
pub const DOCUMENT_ERROR: &str = "DOCUMENT_ERROR";
