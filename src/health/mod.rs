// src/health/mod.rs
mod formatter;
mod status;

pub use formatter::{format_check_error, format_status, UNSET_ERROR_MESSAGE};
pub use status::{DependencyStatus, Health, HealthState};
