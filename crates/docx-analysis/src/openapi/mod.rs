//! Interface document output: error schemas, response entries and the
//! generation entry point.

pub mod generate;
pub mod model_schema;
pub mod schema;
pub mod writer;

pub use generate::{generate, GenerateOptions, GenerateReport, GenerateStats};
pub use model_schema::model_schema;
pub use schema::{http_exception_schema, ErrorSchema, HTTP_EXCEPTION_SCHEMA};
pub use writer::{add_model_to_openapi, write_response, CustomErrorDoc};
