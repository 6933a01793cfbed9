//! Fakes for the metric provider, notifier and tick source, shared by the
//! unit tests and the integration tests.

use crate::core::{Measurement, MetricProvider, Notifier, ResourceUsage};
use crate::sampler::Ticker;
use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use tokio::sync::{mpsc, watch, Notify};

/// A metric provider that returns whatever usage it was last given.
#[derive(Debug)]
pub struct FakeMetricProvider {
    usage: Mutex<ResourceUsage>,
    calls: AtomicUsize,
}

impl FakeMetricProvider {
    pub fn new(usage: ResourceUsage) -> Self {
        Self {
            usage: Mutex::new(usage),
            calls: AtomicUsize::new(0),
        }
    }

    /// A provider whose every query fails.
    pub fn failing() -> Self {
        Self::new(ResourceUsage {
            cpu: Measurement::Failed,
            memory: Measurement::Failed,
            disk: Measurement::Failed,
        })
    }

    pub fn set_usage(&self, usage: ResourceUsage) {
        *self.usage.lock().unwrap() = usage;
    }

    /// Number of full samples taken.
    pub fn sample_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MetricProvider for FakeMetricProvider {
    fn cpu_percent(&self) -> Measurement {
        self.usage.lock().unwrap().cpu
    }

    fn memory_percent(&self) -> Measurement {
        self.usage.lock().unwrap().memory
    }

    fn disk_percent(&self) -> Measurement {
        self.usage.lock().unwrap().disk
    }

    fn sample(&self) -> ResourceUsage {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.usage.lock().unwrap()
    }
}

/// A notifier that records every (title, message) pair it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    notify: Arc<Notify>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Waits until at least `count` notifications have been recorded.
    pub async fn wait_for(&self, count: usize, timeout: std::time::Duration) {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                if self.sent.lock().unwrap().len() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait)
            .await
            .expect("Timed out waiting for notifications");
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn notify(&self, title: &str, message: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
        self.notify.notify_waiters();
        Ok(())
    }
}

/// A notifier whose deliveries always fail.
#[derive(Debug, Clone, Default)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    fn name(&self) -> &str {
        "failing"
    }

    async fn notify(&self, _title: &str, _message: &str) -> anyhow::Result<()> {
        anyhow::bail!("notification daemon unavailable")
    }
}

/// A tick source driven by the test through a [`TickHandle`].
///
/// Every call to `tick` is counted before it starts waiting, so the handle
/// can tell when the pass triggered by a tick has finished. Once the handle
/// is dropped the ticker never fires again.
pub struct ManualTicker {
    rx: mpsc::UnboundedReceiver<()>,
    waits: watch::Sender<usize>,
}

impl ManualTicker {
    pub fn new() -> (TickHandle, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (waits, waits_rx) = watch::channel(0);
        let handle = TickHandle {
            tx,
            waits: waits_rx,
            sent: AtomicUsize::new(0),
        };
        (handle, Self { rx, waits })
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) {
        self.waits.send_modify(|n| *n += 1);
        if self.rx.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

/// The test side of a [`ManualTicker`].
#[derive(Debug)]
pub struct TickHandle {
    tx: mpsc::UnboundedSender<()>,
    waits: watch::Receiver<usize>,
    sent: AtomicUsize,
}

impl TickHandle {
    /// Fires one tick without waiting for the pass it triggers.
    pub fn tick(&self) {
        self.tx.send(()).expect("sampler ticker closed");
        self.sent.fetch_add(1, Ordering::SeqCst);
    }

    /// Fires one tick and waits until the resulting pass has completed.
    pub async fn pass(&self) {
        self.tick();
        self.wait_idle().await;
    }

    /// Waits until every tick fired so far has been fully processed, i.e. the
    /// sampler is back waiting for the next one.
    pub async fn wait_idle(&self) {
        let target = self.sent.load(Ordering::SeqCst) + 1;
        let mut waits = self.waits.clone();
        let reached = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            waits.wait_for(|n| *n >= target),
        )
        .await;
        assert!(
            matches!(reached, Ok(Ok(_))),
            "sampler did not finish its pass"
        );
    }
}
