//! # Internal Metrics Module
//!
//! This module provides the infrastructure for collecting and exposing
//! application metrics about the sampler and the alert pipeline.
//!
//! ## Components:
//!
//! - **`MetricsBuilder`**: The entry point for initializing the metrics system.
//!   It sets up the Prometheus recorder, binds the metrics server, and
//!   constructs the `Metrics` handle.
//!
//! - **`Metrics`**: A lightweight, cloneable struct that serves as the public
//!   API for the rest of the application to record sampling and alerting
//!   events.
//!
//! - **`MetricsServer`**: (Defined in `server.rs`) An `axum`-based web server
//!   that exposes the `/metrics` endpoint for Prometheus to scrape.

use crate::config::MetricsConfig;
use crate::core::{Measurement, Resource, ResourceUsage};
use crate::internal_metrics::server::MetricsServer;
use anyhow::Result;
use metrics::{Counter, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::error;

pub mod server;

/// The public API for the metrics system.
#[derive(Clone)]
pub struct Metrics {
    enabled: bool,
    samples_total: Counter,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl Metrics {
    /// Creates a new `Metrics` instance and registers descriptions for all
    /// supported metrics with the global recorder.
    pub fn new() -> Self {
        metrics::describe_counter!(
            "samples_total",
            Unit::Count,
            "Total number of sampler iterations completed."
        );
        metrics::describe_counter!(
            "measurement_failures_total",
            Unit::Count,
            "Total number of failed utilization queries, labeled by resource."
        );
        metrics::describe_counter!(
            "alerts_sent_total",
            Unit::Count,
            "Total number of alerts delivered, labeled by resource."
        );
        metrics::describe_counter!(
            "alert_failures_total",
            Unit::Count,
            "Total number of alerts that could not be delivered, labeled by resource."
        );
        metrics::describe_gauge!(
            "resource_usage_percent",
            Unit::Percent,
            "The most recent utilization sampled for each resource."
        );

        Self {
            enabled: true,
            samples_total: metrics::counter!("samples_total"),
        }
    }

    /// Creates a `Metrics` instance that performs no operations.
    /// Used when metrics are disabled in the configuration.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            samples_total: Counter::noop(),
        }
    }

    /// Records one completed sampler iteration.
    pub fn record_sample(&self, usage: &ResourceUsage) {
        if !self.enabled {
            return;
        }
        self.samples_total.increment(1);
        for resource in Resource::ALL {
            match usage.get(resource) {
                Measurement::Measured(v) => {
                    metrics::gauge!("resource_usage_percent", "resource" => resource.as_str())
                        .set(v);
                }
                Measurement::Failed => {
                    metrics::counter!("measurement_failures_total", "resource" => resource.as_str())
                        .increment(1);
                }
            }
        }
    }

    pub fn increment_alerts_sent(&self, resource: Resource) {
        if self.enabled {
            metrics::counter!("alerts_sent_total", "resource" => resource.as_str()).increment(1);
        }
    }

    pub fn increment_alert_failures(&self, resource: Resource) {
        if self.enabled {
            metrics::counter!("alert_failures_total", "resource" => resource.as_str()).increment(1);
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Builder for the metrics system.
///
/// This builder is responsible for initializing the `PrometheusRecorder`,
/// binding the `MetricsServer`, and creating the `Metrics` handle.
pub struct MetricsBuilder {
    config: MetricsConfig,
}

impl MetricsBuilder {
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    /// Initializes the metrics system and returns a `Metrics` handle and an
    /// optional `MetricsServer` with its bound address.
    ///
    /// If metrics are disabled in the configuration, or the exporter cannot be
    /// set up, this returns a disabled `Metrics` instance and `None`. A broken
    /// exporter is not a reason to stop sampling.
    pub async fn build(
        self,
        shutdown_rx: watch::Receiver<bool>,
    ) -> (Metrics, Option<(MetricsServer, SocketAddr)>) {
        if !self.config.enabled {
            return (Metrics::disabled(), None);
        }

        match self.try_build(shutdown_rx).await {
            Ok((metrics, server, addr)) => (metrics, Some((server, addr))),
            Err(e) => {
                error!("Failed to initialize metrics exporter: {:#}", e);
                (Metrics::disabled(), None)
            }
        }
    }

    async fn try_build(
        self,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<(Metrics, MetricsServer, SocketAddr)> {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        // Bind before installing the recorder so a port clash leaves the
        // global recorder untouched.
        let listener = TcpListener::bind(self.config.listen_address).await?;
        let addr = listener.local_addr()?;

        metrics::set_global_recorder(recorder)
            .map_err(|_| anyhow::anyhow!("a global metrics recorder is already installed"))?;

        let metrics = Metrics::new();
        let server = MetricsServer::new(listener, handle, shutdown_rx);
        Ok((metrics, server, addr))
    }
}
