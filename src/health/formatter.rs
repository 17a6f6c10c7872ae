// src/health/formatter.rs
use super::status::{DependencyStatus, Health, HealthState};
use crate::check::{CheckDefinition, CheckResult, ErrorInfo, StatusCode};
use chrono::Utc;

pub const UNSET_ERROR_MESSAGE: &str = "no error message provided";

/// Turns a check outcome into a status snapshot.
///
/// Skipped checks always read as OK with zero latency. Warnings count as
/// healthy. Critical and unrecognized codes are unhealthy and carry the
/// reported error, falling back to the reported message and then to
/// `UNSET_ERROR_MESSAGE`.
pub fn format_status(
    definition: &CheckDefinition,
    result: &CheckResult,
    latency_ms: u64,
    skipped: bool,
) -> DependencyStatus {
    if skipped {
        return build(definition, HealthState::Ok, 0, true, None, None);
    }

    match StatusCode::from_code(result.code()) {
        Some(StatusCode::Ok) => build(definition, HealthState::Ok, latency_ms, false, None, None),
        Some(StatusCode::Warning) => build(
            definition,
            HealthState::Warning,
            latency_ms,
            false,
            None,
            result.message().map(str::to_string),
        ),
        Some(StatusCode::Critical) | None => {
            let error = result.error().cloned();
            let message = match (&error, result.message()) {
                (_, Some(message)) => Some(message.to_string()),
                (Some(_), None) => None,
                (None, None) => Some(UNSET_ERROR_MESSAGE.to_string()),
            };
            build(definition, HealthState::Critical, latency_ms, false, error, message)
        }
    }
}

/// Status for a check that failed to produce a result at all.
pub fn format_check_error(
    definition: &CheckDefinition,
    error: ErrorInfo,
    latency_ms: u64,
) -> DependencyStatus {
    build(
        definition,
        HealthState::Critical,
        latency_ms,
        false,
        Some(error),
        Some(format!("error checking dependency {}", definition.name)),
    )
}

fn build(
    definition: &CheckDefinition,
    state: HealthState,
    latency_ms: u64,
    skipped: bool,
    error: Option<ErrorInfo>,
    error_message: Option<String>,
) -> DependencyStatus {
    DependencyStatus {
        name: definition.name.clone(),
        description: definition.description.clone(),
        impact: definition.impact.clone(),
        contact: definition.contact.clone(),
        health: Health {
            state,
            code: state.status_code().code(),
            latency: latency_ms,
            skipped,
        },
        healthy: state != HealthState::Critical,
        last_checked: Utc::now(),
        details: definition.details.clone(),
        error,
        error_message,
    }
}
