//! Configuration management for SysGuard
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to layer built-in defaults, a `sysguard.toml` file, environment
//! variables and command-line arguments, in that order of precedence.

use crate::cli::Cli;
use crate::core::{AlertConfig, Resource, ThresholdSet};
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// The configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "sysguard.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Configuration for the HTTP control API.
    pub server: ServerConfig,
    /// Initial alert configuration and validation policy.
    pub alerts: AlertsConfig,
    /// Configuration for the OS metric provider.
    pub provider: ProviderConfig,
    /// Configuration for alert delivery.
    pub notification: NotificationConfig,
    /// Configuration for the internal Prometheus exporter.
    pub metrics: MetricsConfig,
}

/// Configuration for the HTTP control API.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// The address the API listens on.
    pub listen_address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// Start-up alert settings. These only seed the runtime store; the API can
/// change them afterwards.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AlertsConfig {
    /// Whether alerting is enabled at start-up.
    pub enabled: bool,
    pub cpu_threshold: f64,
    pub memory_threshold: f64,
    pub disk_threshold: f64,
    /// Reject threshold updates outside `[0, 100]`.
    pub enforce_threshold_range: bool,
}

impl AlertsConfig {
    /// The alert configuration the store starts from.
    pub fn initial(&self) -> AlertConfig {
        AlertConfig {
            enabled: self.enabled,
            thresholds: ThresholdSet {
                cpu: self.cpu_threshold,
                memory: self.memory_threshold,
                disk: self.disk_threshold,
            },
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cpu_threshold: ThresholdSet::DEFAULT_PERCENT,
            memory_threshold: ThresholdSet::DEFAULT_PERCENT,
            disk_threshold: ThresholdSet::DEFAULT_PERCENT,
            enforce_threshold_range: false,
        }
    }
}

/// Configuration for the OS metric provider.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Mount point of the volume whose usage is reported as "disk".
    pub disk_mount_point: PathBuf,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            disk_mount_point: PathBuf::from("/"),
        }
    }
}

/// The notification backend to deliver alerts with.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NotificationBackend {
    #[default]
    Desktop,
    Log,
}

impl fmt::Display for NotificationBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationBackend::Desktop => write!(f, "desktop"),
            NotificationBackend::Log => write!(f, "log"),
        }
    }
}

/// Configuration for alert delivery.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NotificationConfig {
    pub backend: NotificationBackend,
    /// Upper bound on a single delivery attempt.
    pub timeout_seconds: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            backend: NotificationBackend::Desktop,
            timeout_seconds: 10,
        }
    }
}

/// Configuration for the internal Prometheus exporter.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub listen_address: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_address: SocketAddr::from(([127, 0, 0, 1], 9090)),
        }
    }
}

impl Config {
    /// Builds the layered configuration sources without extracting them.
    pub fn figment(cli: &Cli) -> Figment {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // e.g. SYSGUARD_LOG_LEVEL=debug, SYSGUARD_SERVER__LISTEN_ADDRESS=127.0.0.1:9000
            .merge(Env::prefixed("SYSGUARD_").split("__"))
            .merge(cli.clone())
    }

    /// Loads the application configuration.
    ///
    /// Fails if an explicitly requested configuration file does not exist, or
    /// if any source holds a value of the wrong type.
    pub fn load(cli: &Cli) -> Result<Self> {
        if let Some(path) = &cli.config {
            if !path.exists() {
                bail!("Configuration file not found at {}", path.display());
            }
        }
        let config: Config = Self::figment(cli).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the start-up thresholds with the same rules the API applies.
    ///
    /// Non-finite thresholds are always rejected. Finite values outside
    /// `[0, 100]` are rejected only when `alerts.enforce_threshold_range` is
    /// set.
    pub fn validate(&self) -> Result<()> {
        let thresholds = self.alerts.initial().thresholds;
        for resource in Resource::ALL {
            let value = thresholds.get(resource);
            if !value.is_finite() {
                bail!("alerts: {} threshold must be a finite number, got {}", resource, value);
            }
        }
        if self.alerts.enforce_threshold_range {
            if let Some((resource, value)) = thresholds.first_out_of_range() {
                bail!(
                    "alerts: {} threshold {} is outside the range [0, 100]",
                    resource,
                    value
                );
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerConfig::default(),
            alerts: AlertsConfig::default(),
            provider: ProviderConfig::default(),
            notification: NotificationConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}
