//! Router-level tests for the control API.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router.

#[path = "../helpers/mod.rs"]
mod helpers;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use helpers::{body_bytes, body_json, get_request, post_request, usage};
use serde_json::json;
use std::sync::Arc;
use sysguard::{
    api::{router, ApiState},
    core::{AlertConfig, Measurement, ResourceUsage, ThresholdSet},
    store::AlertStore,
    test_utils::FakeMetricProvider,
};
use tower::ServiceExt;

fn state_with(usage: ResourceUsage) -> (ApiState, AlertStore, Arc<FakeMetricProvider>) {
    let store = AlertStore::new(AlertConfig::default());
    let provider = Arc::new(FakeMetricProvider::new(usage));
    (ApiState::new(store.clone(), provider.clone()), store, provider)
}

fn default_state() -> (ApiState, AlertStore) {
    let (state, store, _) = state_with(usage(10.0, 20.0, 30.0));
    (state, store)
}

// ---------------------------------------------------------------------------
// /toggle-alerts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn toggle_alerts_sets_the_flag_and_returns_empty_ok() {
    let (state, store) = default_state();
    store.set_alerts_enabled(false);

    let response = router(state)
        .oneshot(post_request("/toggle-alerts", r#"{"enable_alerts": true}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());
    assert!(store.alerts_enabled());
}

#[tokio::test]
async fn toggle_alerts_is_idempotent() {
    let (state, store) = default_state();
    let app = router(state);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_request("/toggle-alerts", r#"{"enable_alerts": false}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!store.alerts_enabled());
    }
}

#[tokio::test]
async fn toggle_alerts_rejects_malformed_json_without_mutation() {
    let (state, store) = default_state();

    let response = router(state)
        .oneshot(post_request("/toggle-alerts", "not-json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].is_string());
    assert!(store.alerts_enabled());
}

#[tokio::test]
async fn toggle_alerts_requires_the_flag() {
    let (state, store) = default_state();

    let response = router(state)
        .oneshot(post_request("/toggle-alerts", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.alerts_enabled());
}

#[tokio::test]
async fn toggle_alerts_accepts_bodies_without_content_type() {
    let (state, store) = default_state();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/toggle-alerts")
        .body(Body::from(r#"{"enable_alerts": false}"#))
        .unwrap();

    let response = router(state).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!store.alerts_enabled());
}

#[tokio::test]
async fn toggle_alerts_rejects_other_methods() {
    let (state, store) = default_state();

    let response = router(state)
        .oneshot(get_request("/toggle-alerts"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(store.alerts_enabled());
}

// ---------------------------------------------------------------------------
// /limit-changer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn limit_changer_replaces_and_echoes_thresholds() {
    let (state, store) = default_state();

    let response = router(state)
        .oneshot(post_request(
            "/limit-changer",
            r#"{"cpu_threshold":80,"memory_threshold":70,"disk_threshold":75}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    let json = body_json(response).await;
    assert_eq!(
        json,
        json!({"CPUThreshold": 80.0, "MemoryThreshold": 70.0, "DiskThreshold": 75.0})
    );
    assert_eq!(
        store.thresholds(),
        ThresholdSet {
            cpu: 80.0,
            memory: 70.0,
            disk: 75.0
        }
    );
}

#[tokio::test]
async fn limit_changer_is_a_full_replace_and_idempotent() {
    let (state, store) = default_state();
    let app = router(state);
    store.set_thresholds(ThresholdSet {
        cpu: 1.0,
        memory: 2.0,
        disk: 3.0,
    });

    let body = r#"{"cpu_threshold":55.5,"memory_threshold":66.5,"disk_threshold":77.5}"#;
    let first = app
        .clone()
        .oneshot(post_request("/limit-changer", body))
        .await
        .unwrap();
    let first = body_json(first).await;
    let second = app
        .oneshot(post_request("/limit-changer", body))
        .await
        .unwrap();
    let second = body_json(second).await;

    assert_eq!(first, second);
    assert_eq!(
        store.thresholds(),
        ThresholdSet {
            cpu: 55.5,
            memory: 66.5,
            disk: 77.5
        }
    );
}

#[tokio::test]
async fn limit_changer_accepts_out_of_range_values_by_default() {
    let (state, store) = default_state();

    let response = router(state)
        .oneshot(post_request(
            "/limit-changer",
            r#"{"cpu_threshold":-10,"memory_threshold":150,"disk_threshold":50}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.thresholds().cpu, -10.0);
    assert_eq!(store.thresholds().memory, 150.0);
}

#[tokio::test]
async fn limit_changer_enforces_range_when_configured() {
    let (state, store) = default_state();
    let state = state.with_threshold_range_check(true);

    let response = router(state)
        .oneshot(post_request(
            "/limit-changer",
            r#"{"cpu_threshold":80,"memory_threshold":150,"disk_threshold":50}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("Memory"));
    assert_eq!(store.thresholds(), ThresholdSet::default());
}

#[tokio::test]
async fn limit_changer_rejects_partial_or_malformed_bodies() {
    let (state, store) = default_state();
    let app = router(state);

    for body in [
        "not-json",
        r#"{"cpu_threshold":80}"#,
        r#"{"cpu_threshold":"high","memory_threshold":70,"disk_threshold":75}"#,
    ] {
        let response = app
            .clone()
            .oneshot(post_request("/limit-changer", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
    }
    assert_eq!(store.thresholds(), ThresholdSet::default());
}

#[tokio::test]
async fn limit_changer_accepts_echo_field_names() {
    let (state, store) = default_state();

    let response = router(state)
        .oneshot(post_request(
            "/limit-changer",
            r#"{"CPUThreshold":81,"MemoryThreshold":71,"DiskThreshold":76}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.thresholds().disk, 76.0);
}

// ---------------------------------------------------------------------------
// /resource-usage and /alert-config
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resource_usage_queries_the_provider_each_time() {
    let (state, _store, provider) = state_with(usage(12.5, 40.0, 70.25));
    let app = router(state);

    let json = body_json(app.clone().oneshot(get_request("/resource-usage")).await.unwrap()).await;
    assert_eq!(
        json,
        json!({"cpu_usage": 12.5, "memory_usage": 40.0, "disk_usage": 70.25})
    );

    provider.set_usage(usage(99.0, 40.0, 70.25));
    let json = body_json(app.oneshot(get_request("/resource-usage")).await.unwrap()).await;
    assert_eq!(json["cpu_usage"], 99.0);
    assert_eq!(provider.sample_count(), 2);
}

#[tokio::test]
async fn resource_usage_reports_failures_as_sentinel() {
    let (state, _store, _) = state_with(ResourceUsage {
        cpu: Measurement::Measured(5.0),
        memory: Measurement::Failed,
        disk: Measurement::Failed,
    });

    let response = router(state)
        .oneshot(get_request("/resource-usage"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    for field in ["cpu_usage", "memory_usage", "disk_usage"] {
        let value = json[field].as_f64().expect("field must be numeric");
        assert!(value == -1.0 || (0.0..=100.0).contains(&value));
    }
    assert_eq!(json["memory_usage"], -1.0);
}

#[tokio::test]
async fn alert_config_reflects_the_store() {
    let (state, store) = default_state();
    store.set_alerts_enabled(false);
    store.set_thresholds(ThresholdSet {
        cpu: 80.0,
        memory: 70.0,
        disk: 75.0,
    });

    let response = router(state).oneshot(get_request("/alert-config")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "enable_alerts": false,
            "CPUThreshold": 80.0,
            "MemoryThreshold": 70.0,
            "DiskThreshold": 75.0
        })
    );
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let (state, _) = default_state();
    let response = router(state).oneshot(get_request("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
