// src/check/definition.rs
use super::result::CheckResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A health check against one dependency.
///
/// Returning `Err` means the check itself blew up; the monitor turns that
/// into a CRITICAL status. Closures of the shape
/// `|| async { ... }` implement this trait automatically.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> anyhow::Result<CheckResult>;
}

#[async_trait]
impl<F, Fut> HealthCheck for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<CheckResult>> + Send + 'static,
{
    async fn check(&self) -> anyhow::Result<CheckResult> {
        (self)().await
    }
}

/// Descriptive metadata attached to a check and echoed in its status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CheckDetails {
    Generic {
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attributes: BTreeMap<String, String>,
    },
    Database {
        engine: String,
        host: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        port: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        database: Option<String>,
    },
    Rest {
        url: Url,
        method: String,
    },
    Soap {
        url: Url,
        #[serde(skip_serializing_if = "Option::is_none")]
        action: Option<String>,
    },
}

/// A registered dependency check. Immutable once built.
pub struct CheckDefinition {
    pub name: String,
    pub description: String,
    pub impact: String,
    pub skip: bool,
    pub contact: Option<BTreeMap<String, String>>,
    pub details: Option<CheckDetails>,
    pub cache_duration: Option<Duration>,
    pub refresh_threshold: Option<Duration>,
    pub timeout: Option<Duration>,
    pub(crate) check: Option<Arc<dyn HealthCheck>>,
}

impl CheckDefinition {
    pub fn builder(name: impl Into<String>) -> CheckDefinitionBuilder {
        CheckDefinitionBuilder::new(name)
    }

    pub fn has_check(&self) -> bool {
        self.check.is_some()
    }
}

impl fmt::Debug for CheckDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckDefinition")
            .field("name", &self.name)
            .field("impact", &self.impact)
            .field("skip", &self.skip)
            .field("has_check", &self.check.is_some())
            .field("cache_duration", &self.cache_duration)
            .field("refresh_threshold", &self.refresh_threshold)
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub struct CheckDefinitionBuilder {
    definition: CheckDefinition,
}

impl CheckDefinitionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            definition: CheckDefinition {
                name: name.into(),
                description: String::new(),
                impact: String::new(),
                skip: false,
                contact: None,
                details: None,
                cache_duration: None,
                refresh_threshold: None,
                timeout: None,
                check: None,
            },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.definition.description = description.into();
        self
    }

    pub fn impact(mut self, impact: impl Into<String>) -> Self {
        self.definition.impact = impact.into();
        self
    }

    pub fn skip(mut self, skip: bool) -> Self {
        self.definition.skip = skip;
        self
    }

    pub fn contact(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.definition
            .contact
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn details(mut self, details: CheckDetails) -> Self {
        self.definition.details = Some(details);
        self
    }

    /// Overrides the monitor's cache duration. Without a matching
    /// `refresh_threshold`, the monitor-wide threshold still applies.
    pub fn cache_duration(mut self, ttl: Duration) -> Self {
        self.definition.cache_duration = Some(ttl);
        self
    }

    pub fn refresh_threshold(mut self, threshold: Duration) -> Self {
        self.definition.refresh_threshold = Some(threshold);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.definition.timeout = Some(timeout);
        self
    }

    /// Use an async closure as the check function.
    pub fn check<F, Fut>(self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<CheckResult>> + Send + 'static,
    {
        self.health_check(Arc::new(f))
    }

    pub fn health_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.definition.check = Some(check);
        self
    }

    pub fn build(self) -> CheckDefinition {
        self.definition
    }
}
