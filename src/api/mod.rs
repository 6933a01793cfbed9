//! # Control API
//!
//! The HTTP surface used by the desktop client: it reads live usage and the
//! current alert configuration, and changes the configuration while the
//! sampler keeps running.
//!
//! | Method | Path              | Purpose                           |
//! |--------|-------------------|-----------------------------------|
//! | POST   | `/toggle-alerts`  | switch alerting on or off         |
//! | POST   | `/limit-changer`  | replace all three thresholds      |
//! | GET    | `/resource-usage` | fresh CPU / memory / disk reading |
//! | GET    | `/alert-config`   | current thresholds and flag       |
//!
//! Other methods on these paths are answered with 405.

pub mod error;
pub mod handlers;
pub mod server;

use crate::core::MetricProvider;
use crate::store::AlertStore;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};
pub use server::ApiServer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiState {
    pub store: AlertStore,
    pub provider: Arc<dyn MetricProvider>,
    /// Reject threshold updates outside `[0, 100]`.
    pub enforce_threshold_range: bool,
}

impl ApiState {
    pub fn new(store: AlertStore, provider: Arc<dyn MetricProvider>) -> Self {
        Self {
            store,
            provider,
            enforce_threshold_range: false,
        }
    }

    pub fn with_threshold_range_check(mut self, enforce: bool) -> Self {
        self.enforce_threshold_range = enforce;
        self
    }
}

/// Builds the control API router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/toggle-alerts", post(handlers::toggle_alerts))
        .route("/limit-changer", post(handlers::change_limits))
        .route("/resource-usage", get(handlers::resource_usage))
        .route("/alert-config", get(handlers::alert_config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
