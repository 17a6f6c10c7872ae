// src/check/result.rs
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Status codes a check may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    Ok = 0,
    Critical = 1,
    Warning = 2,
}

impl StatusCode {
    /// Maps a raw code; anything unrecognized is `None`.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(StatusCode::Ok),
            1 => Some(StatusCode::Critical),
            2 => Some(StatusCode::Warning),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        self as i64
    }
}

/// Structured description of a failure, safe to serialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorInfo {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn from_anyhow(error: &anyhow::Error) -> Self {
        let name = if error.is::<tokio::time::error::Elapsed>() {
            "TimeoutError"
        } else {
            "Error"
        };

        Self {
            name: name.to_string(),
            message: error.to_string(),
            stack: Some(format!("{:#}", error)),
        }
    }

    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "check panicked".to_string()
        };

        Self::new("PanicError", message)
    }
}

/// What a check function reports back.
///
/// A bare code converts via `From`, so `Ok(0i64.into())` is a valid check
/// result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    Status(i64),
    Failure {
        code: i64,
        error: Option<ErrorInfo>,
        message: Option<String>,
    },
}

impl CheckResult {
    pub fn ok() -> Self {
        CheckResult::Status(StatusCode::Ok.code())
    }

    pub fn warning() -> Self {
        CheckResult::Status(StatusCode::Warning.code())
    }

    pub fn critical(message: impl Into<String>) -> Self {
        CheckResult::Failure {
            code: StatusCode::Critical.code(),
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn critical_with_error(error: ErrorInfo) -> Self {
        CheckResult::Failure {
            code: StatusCode::Critical.code(),
            error: Some(error),
            message: None,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            CheckResult::Status(code) => *code,
            CheckResult::Failure { code, .. } => *code,
        }
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            CheckResult::Failure { error, .. } => error.as_ref(),
            CheckResult::Status(_) => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            CheckResult::Failure { message, .. } => message.as_deref(),
            CheckResult::Status(_) => None,
        }
    }
}

impl From<i64> for CheckResult {
    fn from(code: i64) -> Self {
        CheckResult::Status(code)
    }
}

impl From<StatusCode> for CheckResult {
    fn from(code: StatusCode) -> Self {
        CheckResult::Status(code.code())
    }
}
