//! The background sampler.
//!
//! On every tick the sampler queries the metric provider, compares each
//! reading against a fresh snapshot of the alert store, and notifies the user
//! about every resource that is over its threshold. Notification failures are
//! logged and never stop the loop.

use crate::core::{AlertConfig, MetricProvider, Notifier, Resource, ResourceUsage};
use crate::internal_metrics::Metrics;
use crate::store::AlertStore;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Time between the end of one sampling pass and the start of the next.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(5);

/// A source of sampling ticks.
#[async_trait]
pub trait Ticker: Send + Sync {
    /// Resolves when the next sampling pass should start.
    async fn tick(&mut self);
}

/// Fires immediately, then waits a fixed period after each pass.
///
/// The wait starts only once the previous pass has finished, so a slow
/// metric query or notification pushes the following pass back instead of
/// causing passes to overlap or bunch up.
#[derive(Debug)]
pub struct SleepTicker {
    period: Duration,
    primed: bool,
}

impl SleepTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            primed: false,
        }
    }
}

impl Default for SleepTicker {
    fn default() -> Self {
        Self::new(SAMPLE_INTERVAL)
    }
}

#[async_trait]
impl Ticker for SleepTicker {
    async fn tick(&mut self) {
        if self.primed {
            tokio::time::sleep(self.period).await;
        } else {
            self.primed = true;
        }
    }
}

/// A resource reading that is over its threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breach {
    pub resource: Resource,
    pub usage: f64,
    pub threshold: f64,
}

impl Breach {
    pub fn title(&self) -> String {
        format!("{} Alert", self.resource)
    }

    pub fn message(&self) -> String {
        format!("{} usage is at {:.2}%!", self.resource, self.usage)
    }
}

/// Decides whether `resource` should raise an alert under `config`.
///
/// Only real readings strictly above the threshold qualify, and only while
/// alerting is enabled. Failed readings never alert, whatever the threshold.
pub fn check(resource: Resource, usage: &ResourceUsage, config: &AlertConfig) -> Option<Breach> {
    if !config.enabled {
        return None;
    }
    let threshold = config.thresholds.get(resource);
    let measurement = usage.get(resource);
    if !measurement.exceeds(threshold) {
        return None;
    }
    measurement.value().map(|usage| Breach {
        resource,
        usage,
        threshold,
    })
}

/// Evaluates all resources against a single configuration snapshot.
pub fn evaluate(usage: &ResourceUsage, config: &AlertConfig) -> Vec<Breach> {
    Resource::ALL
        .into_iter()
        .filter_map(|r| check(r, usage, config))
        .collect()
}

/// Runs the provider's blocking queries on the blocking thread pool.
pub async fn sample(provider: Arc<dyn MetricProvider>) -> anyhow::Result<ResourceUsage> {
    let usage = tokio::task::spawn_blocking(move || provider.sample()).await?;
    Ok(usage)
}

/// Periodically samples resource usage and raises alerts.
pub struct Sampler {
    provider: Arc<dyn MetricProvider>,
    notifier: Arc<dyn Notifier>,
    store: AlertStore,
    metrics: Metrics,
    ticker: Box<dyn Ticker>,
}

impl Sampler {
    pub fn new(
        provider: Arc<dyn MetricProvider>,
        notifier: Arc<dyn Notifier>,
        store: AlertStore,
        metrics: Metrics,
    ) -> Self {
        Self {
            provider,
            notifier,
            store,
            metrics,
            ticker: Box::new(SleepTicker::default()),
        }
    }

    /// Replaces the tick source.
    pub fn with_ticker(mut self, ticker: Box<dyn Ticker>) -> Self {
        self.ticker = ticker;
        self
    }

    /// Runs the sampling loop until the shutdown signal changes.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            notifier = self.notifier.name(),
            interval_secs = SAMPLE_INTERVAL.as_secs(),
            "Sampler started."
        );
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Sampler received shutdown signal.");
                    break;
                }
                _ = self.ticker.tick() => {}
            }

            // A pass in flight is abandoned on shutdown rather than finished.
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Sampler received shutdown signal during a pass.");
                    break;
                }
                _ = self.run_once() => {}
            }
        }
        info!("Sampler finished.");
    }

    /// Performs a single sampling pass and returns the alerts it raised.
    pub async fn run_once(&self) -> Vec<Breach> {
        let usage = match sample(self.provider.clone()).await {
            Ok(usage) => usage,
            Err(e) => {
                error!("Metric query task failed: {}", e);
                return Vec::new();
            }
        };
        debug!(?usage, "Sampled resource usage");
        self.metrics.record_sample(&usage);

        let mut raised = Vec::new();
        for resource in Resource::ALL {
            // Re-read the store per resource so an update made mid-pass is
            // picked up as early as possible.
            let config = self.store.snapshot();
            if let Some(breach) = check(resource, &usage, &config) {
                self.alert(&breach).await;
                raised.push(breach);
            }
        }
        raised
    }

    async fn alert(&self, breach: &Breach) {
        warn!(
            resource = %breach.resource,
            usage = breach.usage,
            threshold = breach.threshold,
            "Usage above threshold"
        );
        match self.notifier.notify(&breach.title(), &breach.message()).await {
            Ok(()) => self.metrics.increment_alerts_sent(breach.resource),
            Err(e) => {
                error!(
                    resource = %breach.resource,
                    notifier = self.notifier.name(),
                    "Error sending notification: {:#}",
                    e
                );
                self.metrics.increment_alert_failures(breach.resource);
            }
        }
    }
}
