//! The shared alert configuration.
//!
//! `AlertStore` is the only state shared between the sampler and the HTTP
//! handlers. Thresholds and the enabled flag sit behind a single lock so a
//! reader always sees one committed configuration, never a mix of two.

use crate::core::{AlertConfig, ThresholdSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// A cloneable handle to the process-wide alert configuration.
#[derive(Clone, Debug, Default)]
pub struct AlertStore {
    inner: Arc<Mutex<AlertConfig>>,
}

impl AlertStore {
    pub fn new(initial: AlertConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(initial)),
        }
    }

    // The guarded data is plain `Copy` values, so a panic in another holder
    // cannot leave it half-written.
    fn lock(&self) -> MutexGuard<'_, AlertConfig> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns a consistent copy of the thresholds and the enabled flag.
    pub fn snapshot(&self) -> AlertConfig {
        *self.lock()
    }

    pub fn thresholds(&self) -> ThresholdSet {
        self.lock().thresholds
    }

    pub fn alerts_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Replaces all three thresholds and returns the stored set.
    pub fn set_thresholds(&self, thresholds: ThresholdSet) -> ThresholdSet {
        let mut config = self.lock();
        config.thresholds = thresholds;
        info!(
            cpu = thresholds.cpu,
            memory = thresholds.memory,
            disk = thresholds.disk,
            "Thresholds updated"
        );
        config.thresholds
    }

    pub fn set_alerts_enabled(&self, enabled: bool) {
        let mut config = self.lock();
        config.enabled = enabled;
        info!(enabled, "Alerts enabled: {}", enabled);
    }
}
