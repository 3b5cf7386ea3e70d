//! # docx-analysis
//!
//! Static error-response discovery for FastAPI projects.
//! Parses the project from source, rebuilds its route table, traces each
//! handler's call graph for raised HTTP errors and writes them into the
//! interface document.

pub mod discovery;
pub mod eval;
pub mod model;
pub mod openapi;
pub mod parsers;
pub mod query;
pub mod resolver;
pub mod routes;

pub use discovery::{DiscoveryOptions, ErrorFinder, ErrorInstance};
pub use model::Project;
pub use openapi::{generate, GenerateOptions, GenerateReport};
pub use resolver::{Object, Resolver};
pub use routes::{extract_routes, Route};
