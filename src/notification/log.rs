//! A notifier that writes alerts to the application log.
//!
//! Useful on headless hosts where no desktop session is available, and as a
//! way to validate the alerting pipeline end to end.

use crate::core::Notifier;
use async_trait::async_trait;
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, title: &str, message: &str) -> anyhow::Result<()> {
        warn!(title, "{}", message);
        Ok(())
    }
}
