// src/check/mod.rs
mod definition;
mod registry;
mod result;

pub use definition::{CheckDefinition, CheckDefinitionBuilder, CheckDetails, HealthCheck};
pub use registry::CheckRegistry;
pub use result::{CheckResult, ErrorInfo, StatusCode};
