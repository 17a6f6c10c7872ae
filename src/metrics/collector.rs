// src/metrics/collector.rs
use crate::error::Result;
use crate::health::{DependencyStatus, HealthState};
use prometheus::{Encoder, IntGaugeVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

pub const LATENCY_METRIC: &str = "dependency_latency_ms";
pub const HEALTH_METRIC: &str = "dependency_health";

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        Self::with_registry(Registry::new())
    }

    /// Registers the dependency gauges into a registry owned by the host.
    pub fn with_registry(registry: Registry) -> Result<Self> {
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Prometheus text exposition of everything in the registry.
    pub fn gather(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

pub struct MetricsCollector {
    pub dependency_latency_ms: IntGaugeVec,
    pub dependency_health: IntGaugeVec,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let dependency_latency_ms = IntGaugeVec::new(
            Opts::new(LATENCY_METRIC, "Latency of the last dependency check in milliseconds"),
            &["dependency"],
        )?;
        registry.register(Box::new(dependency_latency_ms.clone()))?;

        let dependency_health = IntGaugeVec::new(
            Opts::new(
                HEALTH_METRIC,
                "Dependency health (0=OK, 1=WARNING, 2=CRITICAL)",
            ),
            &["dependency", "impact"],
        )?;
        registry.register(Box::new(dependency_health.clone()))?;

        Ok(Self {
            dependency_latency_ms,
            dependency_health,
        })
    }

    pub fn update(&self, status: &DependencyStatus) {
        let latency = i64::try_from(status.health.latency).unwrap_or(i64::MAX);
        self.dependency_latency_ms
            .with_label_values(&[&status.name])
            .set(latency);

        self.dependency_health
            .with_label_values(&[&status.name, &status.impact])
            .set(health_value(status.health.state.as_str()));
    }
}

/// Gauge value for a health state name; unknown names count as critical.
pub fn health_value(state: &str) -> i64 {
    match HealthState::from_name(state) {
        HealthState::Ok => 0,
        HealthState::Warning => 1,
        HealthState::Critical => 2,
    }
}
