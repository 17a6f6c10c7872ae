// src/monitor/monitor.rs
use crate::cache::TtlCache;
use crate::check::{CheckDefinition, CheckRegistry, CheckResult, ErrorInfo, HealthCheck};
use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::health::{format_check_error, format_status, DependencyStatus};
use crate::metrics::{MetricsCollector, MetricsRegistry};
use arc_swap::ArcSwapOption;
use futures::FutureExt;
use std::convert::Infallible;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Registers dependency checks, evaluates them through the TTL cache and
/// keeps the Prometheus gauges current.
///
/// Most operations take `self: &Arc<Self>` because evaluations and
/// background refreshes run on detached tasks that need their own handle.
pub struct DependencyMonitor {
    config: MonitorConfig,
    registry: CheckRegistry,
    cache: TtlCache<DependencyStatus>,
    metrics: MetricsRegistry,
    collector: Arc<MetricsCollector>,
    scheduler: ArcSwapOption<Scheduler>,
}

struct Scheduler {
    shutdown_tx: watch::Sender<bool>,
}

impl DependencyMonitor {
    pub fn new(config: MonitorConfig) -> Result<Arc<Self>> {
        Self::with_metrics(config, MetricsRegistry::new()?)
    }

    /// Build a monitor whose gauges live in a registry the host already
    /// exposes.
    pub fn with_registry(config: MonitorConfig, registry: prometheus::Registry) -> Result<Arc<Self>> {
        Self::with_metrics(config, MetricsRegistry::with_registry(registry)?)
    }

    fn with_metrics(config: MonitorConfig, metrics: MetricsRegistry) -> Result<Arc<Self>> {
        config
            .validate()
            .map_err(|e| MonitorError::Config(e.to_string()))?;

        let collector = metrics.collector();
        let gauges = collector.clone();
        Ok(Arc::new(Self {
            config,
            registry: CheckRegistry::new(),
            cache: TtlCache::with_listener(move |_: &str, status: &DependencyStatus| {
                gauges.update(status)
            }),
            metrics,
            collector,
            scheduler: ArcSwapOption::empty(),
        }))
    }

    /// Adds a check. Per-check cache overrides are validated against the
    /// monitor defaults they get combined with.
    pub fn register(&self, definition: CheckDefinition) -> Result<()> {
        self.validate_cache_window(&definition)?;
        self.registry.register(definition)
    }

    pub fn names(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Status of one dependency, served from cache while fresh.
    pub async fn get_status(self: &Arc<Self>, name: &str) -> Result<DependencyStatus> {
        let definition = self
            .registry
            .get(name)
            .ok_or_else(|| MonitorError::NotFound(name.to_string()))?;

        Ok(self.resolve(definition).await)
    }

    /// Cached status without triggering an evaluation.
    pub fn cached_status(&self, name: &str) -> Option<DependencyStatus> {
        self.cache.get(name)
    }

    /// Evaluates every registered dependency concurrently. Results come back
    /// in registration order and a failing check only affects its own entry.
    pub async fn get_all_statuses(self: &Arc<Self>) -> Vec<DependencyStatus> {
        let definitions = self.registry.all();

        let tasks: Vec<_> = definitions
            .iter()
            .map(|definition| {
                let monitor = self.clone();
                let definition = definition.clone();
                tokio::spawn(async move { monitor.resolve(definition).await })
            })
            .collect();

        let results = futures::future::join_all(tasks).await;

        definitions
            .iter()
            .zip(results)
            .map(|(definition, result)| match result {
                Ok(status) => status,
                Err(e) => {
                    error!(dependency = %definition.name, "Evaluation task failed: {}", e);
                    self.record_failure(definition, ErrorInfo::new("JoinError", e.to_string()))
                }
            })
            .collect()
    }

    /// Text exposition of the gauges, refreshed by evaluating every
    /// dependency first.
    pub async fn metrics_text(self: &Arc<Self>) -> Result<String> {
        self.get_all_statuses().await;
        self.metrics.gather()
    }

    pub fn metrics_registry(&self) -> &prometheus::Registry {
        self.metrics.registry()
    }

    /// Evaluates everything now, then again every `check_interval_ms`.
    /// Calling `start` on a running monitor restarts the timer.
    pub fn start(self: &Arc<Self>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        if let Some(previous) = self.scheduler.swap(Some(Arc::new(Scheduler { shutdown_tx }))) {
            debug!("Replacing running scheduler");
            let _ = previous.shutdown_tx.send(true);
        }

        tokio::spawn(run_scheduler(
            Arc::downgrade(self),
            self.config.interval(),
            shutdown_rx,
        ));
    }

    /// Cancels the timer. Evaluations already in flight still finish and
    /// land in the cache.
    pub fn stop(&self) {
        if let Some(scheduler) = self.scheduler.swap(None) {
            let _ = scheduler.shutdown_tx.send(true);
        }
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.load().is_some()
    }

    async fn tick(self: &Arc<Self>) {
        let statuses = self.get_all_statuses().await;
        let unhealthy = statuses.iter().filter(|s| !s.healthy).count();

        info!(
            "Dependency check complete: {} healthy, {} unhealthy",
            statuses.len() - unhealthy,
            unhealthy
        );
    }

    /// Effective `(ttl, refresh_threshold)` for a check.
    fn cache_window(&self, definition: &CheckDefinition) -> (Duration, Duration) {
        let ttl = definition
            .cache_duration
            .unwrap_or_else(|| self.config.cache_duration());
        let refresh_threshold = definition
            .refresh_threshold
            .unwrap_or_else(|| self.config.refresh_threshold());
        (ttl, refresh_threshold)
    }

    fn validate_cache_window(&self, definition: &CheckDefinition) -> Result<()> {
        if definition.cache_duration == Some(Duration::ZERO) {
            return Err(MonitorError::Validation(format!(
                "check '{}' has a zero cache_duration",
                definition.name
            )));
        }

        let (ttl, refresh_threshold) = self.cache_window(definition);
        if refresh_threshold < ttl {
            return Ok(());
        }

        if definition.refresh_threshold.is_some() {
            return Err(MonitorError::Validation(format!(
                "check '{}' refresh_threshold ({:?}) must be less than its cache_duration ({:?})",
                definition.name, refresh_threshold, ttl
            )));
        }

        warn!(
            dependency = %definition.name,
            ttl = ?ttl,
            refresh_threshold = ?refresh_threshold,
            "Default refresh threshold covers the whole cache duration; every hit will refresh"
        );
        Ok(())
    }

    /// Caches a failure that happened outside the check itself.
    fn record_failure(&self, definition: &CheckDefinition, error: ErrorInfo) -> DependencyStatus {
        let status = format_check_error(definition, error, 0);
        let (ttl, refresh_threshold) = self.cache_window(definition);
        self.cache
            .set(&definition.name, status.clone(), ttl, refresh_threshold);
        status
    }

    async fn resolve(self: &Arc<Self>, definition: Arc<CheckDefinition>) -> DependencyStatus {
        let (ttl, refresh_threshold) = self.cache_window(&definition);

        let key = definition.name.clone();
        let monitor = self.clone();
        let factory = move || async move { Ok::<_, Infallible>(monitor.evaluate(&definition).await) };

        match self.cache.wrap(&key, factory, ttl, refresh_threshold).await {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }

    async fn evaluate(&self, definition: &CheckDefinition) -> DependencyStatus {
        let status = match (&definition.check, definition.skip) {
            (_, true) => format_status(definition, &CheckResult::ok(), 0, true),
            (Some(check), false) => self.run_check(definition, check.clone()).await,
            (None, false) => format_check_error(
                definition,
                ErrorInfo::new("Error", "no check function registered"),
                0,
            ),
        };

        if status.healthy {
            debug!(
                dependency = %status.name,
                state = %status.health.state,
                latency_ms = status.health.latency,
                "Dependency checked"
            );
        } else {
            warn!(
                dependency = %status.name,
                impact = %status.impact,
                error = ?status.error_message,
                "Dependency is unhealthy"
            );
        }

        status
    }

    async fn run_check(
        &self,
        definition: &CheckDefinition,
        check: Arc<dyn HealthCheck>,
    ) -> DependencyStatus {
        let timeout = definition.timeout.or_else(|| self.config.check_timeout());
        let start = Instant::now();

        let outcome = AssertUnwindSafe(run_with_timeout(check, timeout))
            .catch_unwind()
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(result)) => format_status(definition, &result, latency_ms, false),
            Ok(Err(e)) => format_check_error(definition, ErrorInfo::from_anyhow(&e), latency_ms),
            Err(panic) => {
                format_check_error(definition, ErrorInfo::from_panic(panic.as_ref()), latency_ms)
            }
        }
    }
}

impl Drop for DependencyMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_with_timeout(
    check: Arc<dyn HealthCheck>,
    timeout: Option<Duration>,
) -> anyhow::Result<CheckResult> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, check.check()).await?,
        None => check.check().await,
    }
}

async fn run_scheduler(
    monitor: Weak<DependencyMonitor>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Starting dependency monitor with interval: {:?}", period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(monitor) = monitor.upgrade() else {
                    break;
                };
                monitor.tick().await;
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    info!("Dependency monitor stopped");
}
