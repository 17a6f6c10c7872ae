// tests/monitor_tests.rs
use dependency_monitor::check::ErrorInfo;
use dependency_monitor::{
    CheckDefinition, CheckDetails, CheckResult, DependencyMonitor, HealthState, MonitorConfig,
    MonitorError,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

fn monitor() -> Arc<DependencyMonitor> {
    DependencyMonitor::new(MonitorConfig::default()).unwrap()
}

/// A check that counts invocations, waits `delay` and then reports `result`.
fn counted(
    name: &str,
    counter: &Arc<AtomicU32>,
    delay: Duration,
    result: CheckResult,
) -> dependency_monitor::check::CheckDefinitionBuilder {
    let counter = counter.clone();
    CheckDefinition::builder(name).check(move || {
        let counter = counter.clone();
        let result = result.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            sleep(delay).await;
            Ok(result)
        }
    })
}

#[tokio::test(start_paused = true)]
async fn test_cached_status_is_reused_inside_ttl() {
    let monitor = monitor();
    let calls = Arc::new(AtomicU32::new(0));
    monitor
        .register(
            counted("svc-a", &calls, Duration::from_millis(5), CheckResult::ok())
                .cache_duration(Duration::from_millis(10_000))
                .refresh_threshold(Duration::from_millis(1_000))
                .build(),
        )
        .unwrap();

    let first = monitor.get_status("svc-a").await.unwrap();
    let second = monitor.get_status("svc-a").await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    assert!(second.healthy);
    assert_eq!(second.health.latency, 5);
}

#[tokio::test(start_paused = true)]
async fn test_skipped_check_is_never_invoked() {
    let monitor = monitor();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    monitor
        .register(
            CheckDefinition::builder("svc-b")
                .skip(true)
                .check(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        anyhow::bail!("would have failed")
                    }
                })
                .build(),
        )
        .unwrap();

    let status = monitor.get_status("svc-b").await.unwrap();

    assert!(status.healthy);
    assert_eq!(status.health.code, 0);
    assert_eq!(status.health.latency, 0);
    assert!(status.health.skipped);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failing_check_does_not_abort_the_others() {
    let monitor = monitor();
    let failures = Arc::new(AtomicU32::new(0));
    let counter = failures.clone();

    monitor
        .register(CheckDefinition::builder("svc-ok").check(|| async { Ok(CheckResult::ok()) }).build())
        .unwrap();
    monitor
        .register(
            CheckDefinition::builder("svc-c")
                .check(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        anyhow::bail!("Timeout")
                    }
                })
                .build(),
        )
        .unwrap();
    monitor
        .register(CheckDefinition::builder("svc-warn").check(|| async { Ok(2i64.into()) }).build())
        .unwrap();

    let statuses = monitor.get_all_statuses().await;
    let names: Vec<_> = statuses.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["svc-ok", "svc-c", "svc-warn"]);

    assert!(statuses[0].healthy);
    assert!(statuses[2].healthy);
    assert_eq!(statuses[2].health.state, HealthState::Warning);

    let failed = &statuses[1];
    assert!(!failed.healthy);
    assert_eq!(failed.health.state, HealthState::Critical);
    assert!(failed.error_message.as_deref().unwrap().contains("svc-c"));
    assert_eq!(failed.error.as_ref().map(|e| e.message.as_str()), Some("Timeout"));

    // The failure is cached like any other result.
    let cached = monitor.cached_status("svc-c").unwrap();
    assert!(!cached.healthy);
    monitor.get_status("svc-c").await.unwrap();
    assert_eq!(failures.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reported_critical_carries_error() {
    let monitor = monitor();
    monitor
        .register(
            CheckDefinition::builder("db")
                .check(|| async {
                    Ok(CheckResult::critical_with_error(ErrorInfo::new(
                        "ConnectionError",
                        "connection refused",
                    )))
                })
                .build(),
        )
        .unwrap();

    let status = monitor.get_status("db").await.unwrap();

    assert!(!status.healthy);
    assert_eq!(status.health.code, 1);
    assert_eq!(status.error.unwrap().name, "ConnectionError");
}

#[tokio::test(start_paused = true)]
async fn test_unknown_dependency_is_not_found() {
    let monitor = monitor();

    let err = monitor.get_status("unknown").await.unwrap_err();
    assert!(matches!(err, MonitorError::NotFound(name) if name == "unknown"));
}

/// A check whose n-th call (1-based) waits `delays[n-1]` and reports
/// `results[n-1]`; calls past the end repeat the last entry.
fn scripted(
    name: &str,
    counter: &Arc<AtomicU32>,
    script: Vec<(Duration, CheckResult)>,
) -> dependency_monitor::check::CheckDefinitionBuilder {
    let counter = counter.clone();
    let script = Arc::new(script);
    CheckDefinition::builder(name).check(move || {
        let counter = counter.clone();
        let script = script.clone();
        async move {
            let call = counter.fetch_add(1, Ordering::SeqCst) as usize;
            let (delay, result) = script[call.min(script.len() - 1)].clone();
            sleep(delay).await;
            Ok(result)
        }
    })
}

#[tokio::test(start_paused = true)]
async fn test_stale_status_served_while_refreshing() {
    let monitor = monitor();
    let calls = Arc::new(AtomicU32::new(0));
    monitor
        .register(
            scripted(
                "svc-d",
                &calls,
                vec![
                    (Duration::ZERO, CheckResult::ok()),
                    (Duration::ZERO, CheckResult::warning()),
                ],
            )
            .cache_duration(Duration::from_millis(100))
            .refresh_threshold(Duration::from_millis(40))
            .build(),
        )
        .unwrap();

    let original = monitor.get_status("svc-d").await.unwrap();
    sleep(Duration::from_millis(70)).await;

    let served = monitor.get_status("svc-d").await.unwrap();
    assert_eq!(served, original);
    assert_eq!(served.health.state, HealthState::Ok);

    sleep(Duration::from_millis(5)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let refreshed = monitor.cached_status("svc-d").unwrap();
    assert_eq!(refreshed.health.state, HealthState::Warning);
    assert!(refreshed.healthy);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_refresh_leaves_gauges_matching_cache() {
    let monitor = monitor();
    let calls = Arc::new(AtomicU32::new(0));
    monitor
        .register(
            scripted(
                "svc",
                &calls,
                vec![
                    (Duration::ZERO, CheckResult::ok()),
                    (Duration::from_millis(60), CheckResult::critical("slow and down")),
                    (Duration::ZERO, CheckResult::ok()),
                ],
            )
            .impact("x")
            .cache_duration(Duration::from_millis(100))
            .refresh_threshold(Duration::from_millis(40))
            .build(),
        )
        .unwrap();

    // t=0 inline, t=70 starts the slow refresh, t=100 expired so inline again.
    monitor.get_status("svc").await.unwrap();
    sleep(Duration::from_millis(70)).await;
    monitor.get_status("svc").await.unwrap();
    sleep(Duration::from_millis(30)).await;
    monitor.get_status("svc").await.unwrap();

    // The slow refresh lands at t=130 and is discarded.
    sleep(Duration::from_millis(35)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(monitor.cached_status("svc").unwrap().health.state, HealthState::Ok);

    let text = monitor.metrics_text().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(text.contains("dependency_health{dependency=\"svc\",impact=\"x\"} 0"));
}

#[tokio::test(start_paused = true)]
async fn test_hung_check_times_out() {
    let monitor = monitor();
    let calls = Arc::new(AtomicU32::new(0));
    monitor
        .register(
            counted("slow", &calls, Duration::from_secs(60), CheckResult::ok())
                .timeout(Duration::from_millis(50))
                .build(),
        )
        .unwrap();

    let status = monitor.get_status("slow").await.unwrap();

    assert!(!status.healthy);
    assert_eq!(status.health.latency, 50);
    assert_eq!(status.error.unwrap().name, "TimeoutError");
}

fn exploding_driver() -> anyhow::Result<CheckResult> {
    panic!("driver bug")
}

#[tokio::test(start_paused = true)]
async fn test_panicking_check_becomes_critical() {
    let monitor = monitor();
    monitor
        .register(
            CheckDefinition::builder("explodes")
                .check(|| async { exploding_driver() })
                .build(),
        )
        .unwrap();
    monitor
        .register(CheckDefinition::builder("fine").check(|| async { Ok(CheckResult::ok()) }).build())
        .unwrap();

    let statuses = monitor.get_all_statuses().await;

    assert_eq!(statuses.len(), 2);
    assert!(!statuses[0].healthy);
    assert_eq!(statuses[0].error.as_ref().unwrap().name, "PanicError");
    assert_eq!(statuses[0].error.as_ref().unwrap().message, "driver bug");
    assert!(statuses[1].healthy);
}

#[tokio::test(start_paused = true)]
async fn test_metrics_text_reflects_every_dependency() {
    let monitor = monitor();
    monitor
        .register(
            CheckDefinition::builder("orders-db")
                .impact("orders unavailable")
                .details(CheckDetails::Database {
                    engine: "postgres".to_string(),
                    host: "db.internal".to_string(),
                    port: Some(5432),
                    database: Some("orders".to_string()),
                })
                .check(|| async { Ok(CheckResult::ok()) })
                .build(),
        )
        .unwrap();
    monitor
        .register(
            CheckDefinition::builder("search")
                .impact("degraded search")
                .check(|| async { Ok(CheckResult::critical("index missing")) })
                .build(),
        )
        .unwrap();

    let text = monitor.metrics_text().await.unwrap();

    assert!(text.contains("# TYPE dependency_latency_ms gauge"));
    assert!(text.contains("dependency_latency_ms{dependency=\"orders-db\"} 0"));
    assert!(text.contains("dependency_health{dependency=\"orders-db\",impact=\"orders unavailable\"} 0"));
    assert!(text.contains("dependency_health{dependency=\"search\",impact=\"degraded search\"} 2"));
}

#[tokio::test(start_paused = true)]
async fn test_status_json_shape() {
    let monitor = monitor();
    monitor
        .register(
            CheckDefinition::builder("billing")
                .description("Billing SOAP service")
                .contact("team", "payments")
                .details(CheckDetails::Soap {
                    url: "https://billing.internal/soap".parse().unwrap(),
                    action: Some("Ping".to_string()),
                })
                .check(|| async { Ok(CheckResult::ok()) })
                .build(),
        )
        .unwrap();

    let status = monitor.get_status("billing").await.unwrap();
    let json = serde_json::to_value(&status).unwrap();

    assert_eq!(json["health"]["state"], "OK");
    assert_eq!(json["details"]["type"], "soap");
    assert_eq!(json["contact"]["team"], "payments");
    assert!(json["lastChecked"].is_string());
}

#[tokio::test]
async fn test_registration_errors_surface() {
    let monitor = monitor();

    assert!(matches!(
        monitor.register(CheckDefinition::builder("").skip(true).build()),
        Err(MonitorError::Validation(_))
    ));
    assert!(matches!(
        monitor.register(CheckDefinition::builder("no-fn").build()),
        Err(MonitorError::Validation(_))
    ));
    assert!(matches!(
        monitor.register(
            CheckDefinition::builder("tight")
                .cache_duration(Duration::from_millis(10))
                .refresh_threshold(Duration::from_millis(10))
                .check(|| async { Ok(CheckResult::ok()) })
                .build()
        ),
        Err(MonitorError::Validation(_))
    ));
    assert!(monitor.names().is_empty());
}

#[tokio::test]
async fn test_gauges_mount_into_host_registry() {
    let registry = prometheus::Registry::new();
    let monitor = DependencyMonitor::with_registry(MonitorConfig::default(), registry.clone()).unwrap();
    monitor
        .register(CheckDefinition::builder("cache").check(|| async { Ok(CheckResult::ok()) }).build())
        .unwrap();

    monitor.get_all_statuses().await;

    let families = registry.gather();
    assert!(families.iter().any(|f| f.get_name() == "dependency_health"));
    assert!(families.iter().any(|f| f.get_name() == "dependency_latency_ms"));
}
