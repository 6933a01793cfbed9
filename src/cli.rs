//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged with
//! the configuration from the `sysguard.toml` file and environment variables.

use crate::config::NotificationBackend;
use clap::Parser;
use figment::{
    util::nest,
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Samples local CPU, memory and disk usage, raises desktop alerts when
/// thresholds are crossed, and serves the readings over HTTP.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address for the HTTP API to listen on.
    #[arg(short, long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Logging level (error, warn, info, debug, trace).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Start with alerting switched off.
    #[arg(long)]
    pub disable_alerts: bool,

    /// Notification backend to deliver alerts with.
    #[arg(long, value_enum, value_name = "BACKEND")]
    pub notifier: Option<NotificationBackend>,

    /// Expose internal metrics for Prometheus.
    #[arg(long)]
    pub metrics: bool,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        // Each flag lands in a different section, so the nested dicts never
        // overlap and a plain extend is enough.
        let mut dict = Dict::new();
        let mut set = |key: &str, value: Value| {
            if let Value::Dict(_, nested) = nest(key, value) {
                dict.extend(nested);
            }
        };

        if let Some(level) = &self.log_level {
            set("log_level", Value::from(level.clone()));
        }

        if let Some(addr) = self.listen {
            set("server.listen_address", Value::from(addr.to_string()));
        }

        // Flags only override when present; their absence must not reset a
        // value coming from the file or the environment.
        if self.disable_alerts {
            set("alerts.enabled", Value::from(false));
        }

        if let Some(backend) = self.notifier {
            set("notification.backend", Value::from(backend.to_string()));
        }

        if self.metrics {
            set("metrics.enabled", Value::from(true));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
