//! Handlers for the control API endpoints.
//!
//! Request bodies are read as raw bytes and decoded here rather than through
//! axum's `Json` extractor, so clients that omit `Content-Type` are still
//! served and every decoding problem maps to a plain 400.

use super::error::{ApiError, ApiResult};
use super::ApiState;
use crate::core::ThresholdSet;
use crate::sampler;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Body of `POST /toggle-alerts`. The flag is required; `{}` is rejected.
#[derive(Debug, Deserialize, Serialize)]
pub struct ToggleAlertsRequest {
    pub enable_alerts: bool,
}

/// Body of `POST /limit-changer`. All three thresholds are required.
#[derive(Debug, Deserialize, Serialize)]
pub struct ThresholdsRequest {
    #[serde(alias = "CPUThreshold")]
    pub cpu_threshold: f64,
    #[serde(alias = "MemoryThreshold")]
    pub memory_threshold: f64,
    #[serde(alias = "DiskThreshold")]
    pub disk_threshold: f64,
}

impl From<ThresholdsRequest> for ThresholdSet {
    fn from(req: ThresholdsRequest) -> Self {
        ThresholdSet {
            cpu: req.cpu_threshold,
            memory: req.memory_threshold,
            disk: req.disk_threshold,
        }
    }
}

fn json_response<T: Serialize>(value: &T) -> ApiResult<Response> {
    let body = serde_json::to_vec(value).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}

/// `POST /toggle-alerts`
#[instrument(skip_all)]
pub async fn toggle_alerts(State(state): State<ApiState>, body: Bytes) -> ApiResult<StatusCode> {
    let req: ToggleAlertsRequest = serde_json::from_slice(&body)?;
    state.store.set_alerts_enabled(req.enable_alerts);
    Ok(StatusCode::OK)
}

/// `POST /limit-changer`
#[instrument(skip_all)]
pub async fn change_limits(State(state): State<ApiState>, body: Bytes) -> ApiResult<Response> {
    let req: ThresholdsRequest = serde_json::from_slice(&body)?;
    let thresholds = ThresholdSet::from(req);

    if state.enforce_threshold_range {
        if let Some((resource, value)) = thresholds.first_out_of_range() {
            return Err(ApiError::BadRequest(format!(
                "{} threshold {} is outside 0-100",
                resource, value
            )));
        }
    }

    let stored = state.store.set_thresholds(thresholds);
    json_response(&stored)
}

/// `GET /resource-usage`
///
/// Always queries the provider afresh; readings taken by the sampler are not
/// cached.
#[instrument(skip_all)]
pub async fn resource_usage(State(state): State<ApiState>) -> ApiResult<Response> {
    let usage = sampler::sample(state.provider.clone())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    json_response(&usage)
}

/// `GET /alert-config`
#[instrument(skip_all)]
pub async fn alert_config(State(state): State<ApiState>) -> ApiResult<Response> {
    json_response(&state.store.snapshot())
}
