// src/health/status.rs
use crate::check::{CheckDetails, ErrorInfo, StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthState {
    Ok,
    Warning,
    Critical,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Ok => "OK",
            HealthState::Warning => "WARNING",
            HealthState::Critical => "CRITICAL",
        }
    }

    /// Parses the exposition name; anything unknown reads as critical.
    pub fn from_name(name: &str) -> Self {
        match name {
            "OK" => HealthState::Ok,
            "WARNING" => HealthState::Warning,
            _ => HealthState::Critical,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            HealthState::Ok => StatusCode::Ok,
            HealthState::Warning => StatusCode::Warning,
            HealthState::Critical => StatusCode::Critical,
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub state: HealthState,
    pub code: i64,
    pub latency: u64,
    pub skipped: bool,
}

/// Snapshot of one dependency as of its last evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyStatus {
    pub name: String,
    pub description: String,
    pub impact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<BTreeMap<String, String>>,
    pub health: Health,
    pub healthy: bool,
    pub last_checked: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<CheckDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
