// src/config/models.rs
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub check_interval_ms: u64,
    pub cache_duration_ms: u64,
    pub refresh_threshold_ms: u64,
    pub check_timeout_ms: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 30_000,
            cache_duration_ms: 60_000,
            refresh_threshold_ms: 15_000,
            check_timeout_ms: None,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.check_interval_ms > 0, "check_interval_ms must be greater than zero");
        ensure!(self.cache_duration_ms > 0, "cache_duration_ms must be greater than zero");
        ensure!(
            self.refresh_threshold_ms < self.cache_duration_ms,
            "refresh_threshold_ms ({}) must be less than cache_duration_ms ({})",
            self.refresh_threshold_ms,
            self.cache_duration_ms
        );
        if let Some(timeout) = self.check_timeout_ms {
            ensure!(timeout > 0, "check_timeout_ms must be greater than zero when set");
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn cache_duration(&self) -> Duration {
        Duration::from_millis(self.cache_duration_ms)
    }

    pub fn refresh_threshold(&self) -> Duration {
        Duration::from_millis(self.refresh_threshold_ms)
    }

    pub fn check_timeout(&self) -> Option<Duration> {
        self.check_timeout_ms.map(Duration::from_millis)
    }
}
