// src/metrics/mod.rs
mod collector;

pub use collector::{health_value, MetricsCollector, MetricsRegistry, HEALTH_METRIC, LATENCY_METRIC};
