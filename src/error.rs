// src/error.rs

/// Errors surfaced to callers of the monitor.
///
/// Check execution failures never show up here: they are folded into a
/// CRITICAL `DependencyStatus` instead.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Invalid check definition: {0}")]
    Validation(String),

    #[error("Invalid monitor configuration: {0}")]
    Config(String),

    #[error("Dependency not found: {0}")]
    NotFound(String),

    #[error("Metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Metrics exposition is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
