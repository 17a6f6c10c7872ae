// src/lib.rs
pub mod cache;
pub mod check;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod monitor;

pub use check::{CheckDefinition, CheckDetails, CheckResult, HealthCheck, StatusCode};
pub use config::MonitorConfig;
pub use error::{MonitorError, Result};
pub use health::{DependencyStatus, HealthState};
pub use monitor::DependencyMonitor;
