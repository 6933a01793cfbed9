//! Delivery of threshold alerts to the user.
//!
//! The sampler only knows the [`Notifier`] trait; which backend is used is
//! decided once at start-up from the configuration.
pub mod desktop;
pub mod log;

use crate::config::{NotificationBackend, NotificationConfig};
use crate::core::Notifier;
use std::sync::Arc;
use std::time::Duration;

pub use desktop::{DesktopNotifier, NotifyError};
pub use log::LogNotifier;

/// Builds the notifier selected by the configuration.
pub fn from_config(config: &NotificationConfig) -> Arc<dyn Notifier> {
    match config.backend {
        NotificationBackend::Desktop => Arc::new(DesktopNotifier::new(Duration::from_secs(
            config.timeout_seconds,
        ))),
        NotificationBackend::Log => Arc::new(LogNotifier),
    }
}
