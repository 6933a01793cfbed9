//! The main application logic, decoupled from the entry point.

use crate::{
    api::{self, ApiServer, ApiState},
    config::Config,
    core::{MetricProvider, Notifier},
    internal_metrics::{Metrics, MetricsBuilder},
    notification,
    sampler::{Sampler, Ticker},
    store::AlertStore,
    system::SystemMetricProvider,
    task_manager::TaskManager,
};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

/// A handle to the running application.
pub struct App {
    task_manager: TaskManager,
    api_addr: SocketAddr,
    metrics_addr: Option<SocketAddr>,
    store: AlertStore,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// The address the control API is actually listening on.
    pub fn api_addr(&self) -> SocketAddr {
        self.api_addr
    }

    pub fn metrics_addr(&self) -> Option<SocketAddr> {
        self.metrics_addr
    }

    /// The alert configuration shared by the sampler and the API.
    pub fn store(&self) -> AlertStore {
        self.store.clone()
    }

    /// Waits for the shutdown signal and then gracefully shuts down all tasks.
    pub async fn run(self) -> Result<()> {
        let mut shutdown_rx = self.task_manager.get_shutdown_rx();
        shutdown_rx.changed().await.ok();
        info!("Shutdown signal received. Waiting for tasks to complete...");

        self.task_manager.shutdown().await;
        Ok(())
    }
}

/// Builder for the main application.
///
/// Separates constructing the components from running them, and lets tests
/// swap out the OS-facing collaborators.
pub struct AppBuilder {
    config: Config,
    provider_override: Option<Arc<dyn MetricProvider>>,
    notifier_override: Option<Arc<dyn Notifier>>,
    ticker_override: Option<Box<dyn Ticker>>,
    metrics_override: Option<Metrics>,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            provider_override: None,
            notifier_override: None,
            ticker_override: None,
            metrics_override: None,
        }
    }

    /// Overrides the metric provider for testing.
    pub fn provider_override(mut self, provider: Arc<dyn MetricProvider>) -> Self {
        self.provider_override = Some(provider);
        self
    }

    /// Overrides the notifier for testing.
    pub fn notifier_override(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier_override = Some(notifier);
        self
    }

    /// Overrides the sampler's tick source for testing.
    pub fn ticker_override(mut self, ticker: Box<dyn Ticker>) -> Self {
        self.ticker_override = Some(ticker);
        self
    }

    /// Overrides the metrics system for testing.
    pub fn metrics_override(mut self, metrics: Metrics) -> Self {
        self.metrics_override = Some(metrics);
        self
    }

    /// Builds and starts all application components, returning a runnable `App`.
    ///
    /// Fails if the control API cannot bind its listening address.
    #[instrument(skip_all)]
    pub async fn build(self, shutdown_rx: watch::Receiver<bool>) -> Result<App> {
        let config = self.config;
        let task_manager = TaskManager::new(shutdown_rx.clone());

        // =========================================================================
        // 1. Initialize Metrics
        // =========================================================================
        let (metrics, metrics_addr) = match self.metrics_override {
            Some(m) => (m, None),
            None => {
                let (metrics, server) = MetricsBuilder::new(config.metrics.clone())
                    .build(shutdown_rx.clone())
                    .await;
                let metrics_addr = server.map(|(server, addr)| {
                    task_manager.spawn("MetricsServer", server.run());
                    info!("Metrics exporter listening on http://{}/metrics", addr);
                    addr
                });
                (metrics, metrics_addr)
            }
        };

        // =========================================================================
        // 2. Shared State & Collaborators
        // =========================================================================
        let store = AlertStore::new(config.alerts.initial());

        let provider = match self.provider_override {
            Some(provider) => provider,
            None => {
                let mount_point = config.provider.disk_mount_point.clone();
                debug!(mount_point = %mount_point.display(), "Initializing system metric provider");
                Arc::new(SystemMetricProvider::new(mount_point)) as Arc<dyn MetricProvider>
            }
        };

        let notifier = match self.notifier_override {
            Some(notifier) => notifier,
            None => notification::from_config(&config.notification),
        };

        // =========================================================================
        // 3. Control API
        // =========================================================================
        let listener = TcpListener::bind(config.server.listen_address)
            .await
            .with_context(|| {
                format!("Failed to bind API server to {}", config.server.listen_address)
            })?;
        let state = ApiState::new(store.clone(), provider.clone())
            .with_threshold_range_check(config.alerts.enforce_threshold_range);
        let server = ApiServer::new(listener, api::router(state), shutdown_rx.clone());
        let api_addr = server.local_addr()?;
        task_manager.spawn("ApiServer", server.run());
        info!("Starting backend server on {}...", api_addr);

        // =========================================================================
        // 4. Sampler
        // =========================================================================
        let mut sampler = Sampler::new(provider, notifier, store.clone(), metrics);
        if let Some(ticker) = self.ticker_override {
            sampler = sampler.with_ticker(ticker);
        }
        task_manager.spawn("Sampler", sampler.run(shutdown_rx));

        Ok(App {
            task_manager,
            api_addr,
            metrics_addr,
            store,
        })
    }
}
