//! SysGuard - Local Resource Monitor
//!
//! Samples CPU, memory and disk usage every few seconds, raises desktop
//! alerts above the configured thresholds, and serves the readings over HTTP.

use anyhow::Result;
use clap::Parser;
use sysguard::{app::App, cli::Cli, config::Config};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            // The configured level is unknown here, so fall back to the default.
            tracing_subscriber::fmt().init();
            error!("Failed to load configuration: {:#}", err);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("SysGuard starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("API Address: {}", config.server.listen_address);
    info!("Alerts Enabled: {}", config.alerts.enabled);
    info!(
        "Thresholds: CPU {}%, Memory {}%, Disk {}%",
        config.alerts.cpu_threshold,
        config.alerts.memory_threshold,
        config.alerts.disk_threshold
    );
    let range_check = if config.alerts.enforce_threshold_range {
        "Enforced"
    } else {
        "Disabled"
    };
    info!("Threshold Range Check: {}", range_check);
    info!("Disk Mount Point: {}", config.provider.disk_mount_point.display());
    info!("Notifier: {}", config.notification.backend);
    let exporter = if config.metrics.enabled {
        "Enabled"
    } else {
        "Disabled"
    };
    info!("Metrics Exporter: {}", exporter);
    info!("-------------------------------------------------------");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let app = App::builder(config).build(shutdown_rx).await?;
    let app_handle = tokio::spawn(app.run());

    info!("SysGuard initialized successfully. Monitoring resources...");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Shutting down gracefully...");

    // Send shutdown signal to all tasks
    let _ = shutdown_tx.send(true);

    match app_handle.await {
        Ok(result) => result?,
        Err(e) => error!("Application task panicked: {:?}", e),
    }

    info!("All tasks shut down. Exiting.");
    Ok(())
}
