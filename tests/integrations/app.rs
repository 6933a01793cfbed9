//! End-to-end tests against a running application on a real socket.

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::{app::TestAppBuilder, usage};
use serde_json::{json, Value};
use std::time::Duration;
use sysguard::{app::AppBuilder, config::Config, core::ThresholdSet};
use tokio::sync::watch;

#[tokio::test]
async fn control_api_scenario_over_http() {
    let app = TestAppBuilder::new().start().await.unwrap();
    let client = reqwest::Client::new();

    // Enable alerts.
    let response = client
        .post(app.url("/toggle-alerts"))
        .json(&json!({"enable_alerts": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(app.store.alerts_enabled());

    // Replace the thresholds.
    let response = client
        .post(app.url("/limit-changer"))
        .json(&json!({"cpu_threshold": 80, "memory_threshold": 70, "disk_threshold": 75}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let echo: Value = response.json().await.unwrap();
    assert_eq!(
        echo,
        json!({"CPUThreshold": 80.0, "MemoryThreshold": 70.0, "DiskThreshold": 75.0})
    );

    // A malformed toggle leaves the flag as it was.
    let response = client
        .post(app.url("/toggle-alerts"))
        .body("not-json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert!(app.store.alerts_enabled());

    // Usage is served straight from the provider.
    let usage: Value = client
        .get(app.url("/resource-usage"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        usage,
        json!({"cpu_usage": 10.0, "memory_usage": 20.0, "disk_usage": 30.0})
    );

    app.shutdown(Duration::from_secs(5)).await.unwrap();
}

#[tokio::test]
async fn threshold_update_over_http_changes_the_next_alert_decision() {
    let app = TestAppBuilder::new()
        .with_usage(usage(85.0, 20.0, 30.0))
        .start()
        .await
        .unwrap();

    // 85% is below the default 90% threshold.
    app.pass().await;
    assert!(app.notifier.sent().is_empty());

    let response = reqwest::Client::new()
        .post(app.url("/limit-changer"))
        .json(&json!({"cpu_threshold": 80, "memory_threshold": 90, "disk_threshold": 90}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    app.pass().await;
    assert_eq!(
        app.notifier.sent(),
        vec![("CPU Alert".to_string(), "CPU usage is at 85.00%!".to_string())]
    );

    app.shutdown(Duration::from_secs(5)).await.unwrap();
}

#[tokio::test]
async fn startup_alert_settings_come_from_config() {
    let app = TestAppBuilder::new()
        .with_config_modifier(|config| {
            config.alerts.enabled = false;
            config.alerts.cpu_threshold = 50.0;
        })
        .start()
        .await
        .unwrap();

    let snapshot = app.store.snapshot();
    assert!(!snapshot.enabled);
    assert_eq!(
        snapshot.thresholds,
        ThresholdSet {
            cpu: 50.0,
            memory: 90.0,
            disk: 90.0
        }
    );

    app.shutdown(Duration::from_secs(5)).await.unwrap();
}

#[tokio::test]
async fn build_fails_when_the_api_port_is_taken() {
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut config = Config::default();
    config.server.listen_address = occupied.local_addr().unwrap();

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let result = AppBuilder::new(config)
        .provider_override(std::sync::Arc::new(
            sysguard::test_utils::FakeMetricProvider::new(usage(1.0, 1.0, 1.0)),
        ))
        .metrics_override(sysguard::internal_metrics::Metrics::disabled())
        .build(shutdown_rx)
        .await;

    let err = result.err().expect("binding an occupied port must fail");
    assert!(
        err.to_string().contains("Failed to bind API server"),
        "unexpected error: {}",
        err
    );
}
