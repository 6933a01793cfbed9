//! A notifier that raises native desktop notifications.
//!
//! Delivery is delegated to the platform's notification command
//! (`notify-send` on Linux and the BSDs, `osascript` on macOS). The command
//! runs under a timeout so a hung notification daemon cannot stall the
//! sampler indefinitely.

use crate::core::Notifier;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Errors raised while delivering a desktop notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("desktop notifications are not supported on this platform")]
    Unsupported,
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("notification was not delivered within {0:?}")]
    Timeout(Duration),
}

/// Sends alerts through the desktop's notification service.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    timeout: Duration,
}

impl DesktopNotifier {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn command(title: &str, message: &str) -> Result<(&'static str, Command), NotifyError> {
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("osascript");
            // Pass the text as arguments so it never needs AppleScript quoting.
            cmd.args([
                "-e",
                "on run argv",
                "-e",
                "display notification (item 2 of argv) with title (item 1 of argv) sound name \"Basso\"",
                "-e",
                "end run",
                title,
                message,
            ]);
            Ok(("osascript", cmd))
        } else if cfg!(unix) {
            let mut cmd = Command::new("notify-send");
            cmd.args(["--urgency=critical", "--app-name=sysguard", title, message]);
            Ok(("notify-send", cmd))
        } else {
            Err(NotifyError::Unsupported)
        }
    }

    async fn deliver(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        let (program, mut cmd) = Self::command(title, message)?;
        cmd.kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| NotifyError::Timeout(self.timeout))?
            .map_err(|source| NotifyError::Spawn { program, source })?;

        if output.status.success() {
            debug!(program, "Desktop notification delivered");
            Ok(())
        } else {
            Err(NotifyError::Failed {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    fn name(&self) -> &str {
        "desktop"
    }

    #[instrument(skip(self, message))]
    async fn notify(&self, title: &str, message: &str) -> anyhow::Result<()> {
        self.deliver(title, message).await?;
        Ok(())
    }
}
