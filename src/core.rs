//! Core domain types and service traits for SysGuard
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern component interactions throughout the application.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Serialize, Serializer};
use std::fmt;

/// Wire value reported for a measurement that could not be taken.
pub const FAILED_MEASUREMENT_SENTINEL: f64 = -1.0;

/// The outcome of a single utilization query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// A utilization percentage in `[0, 100]`.
    Measured(f64),
    /// The operating system could not provide a value.
    Failed,
}

impl Measurement {
    /// Builds a measurement from a raw percentage, clamping it into `[0, 100]`.
    /// Non-finite values are treated as failures.
    pub fn from_percent(value: f64) -> Self {
        if value.is_finite() {
            Measurement::Measured(value.clamp(0.0, 100.0))
        } else {
            Measurement::Failed
        }
    }

    /// Returns the measured percentage, or `None` if the query failed.
    pub fn value(&self) -> Option<f64> {
        match self {
            Measurement::Measured(v) => Some(*v),
            Measurement::Failed => None,
        }
    }

    /// Returns `true` only for a real reading strictly above `threshold`.
    pub fn exceeds(&self, threshold: f64) -> bool {
        matches!(self, Measurement::Measured(v) if *v > threshold)
    }

    /// The value as it is reported over the API.
    pub fn as_wire(&self) -> f64 {
        self.value().unwrap_or(FAILED_MEASUREMENT_SENTINEL)
    }
}

impl Serialize for Measurement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_wire())
    }
}

/// One of the monitored resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Cpu,
    Memory,
    Disk,
}

impl Resource {
    /// All resources, in the order the sampler evaluates them.
    pub const ALL: [Resource; 3] = [Resource::Cpu, Resource::Memory, Resource::Disk];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Cpu => "CPU",
            Resource::Memory => "Memory",
            Resource::Disk => "Disk",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time snapshot of local resource utilization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResourceUsage {
    #[serde(rename = "cpu_usage")]
    pub cpu: Measurement,
    #[serde(rename = "memory_usage")]
    pub memory: Measurement,
    #[serde(rename = "disk_usage")]
    pub disk: Measurement,
}

impl ResourceUsage {
    pub fn get(&self, resource: Resource) -> Measurement {
        match resource {
            Resource::Cpu => self.cpu,
            Resource::Memory => self.memory,
            Resource::Disk => self.disk,
        }
    }
}

/// Per-resource alert thresholds, in percent.
///
/// Serialized with the field names the desktop client expects in the
/// `/limit-changer` echo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdSet {
    #[serde(rename = "CPUThreshold")]
    pub cpu: f64,
    #[serde(rename = "MemoryThreshold")]
    pub memory: f64,
    #[serde(rename = "DiskThreshold")]
    pub disk: f64,
}

impl ThresholdSet {
    pub const DEFAULT_PERCENT: f64 = 90.0;

    pub fn get(&self, resource: Resource) -> f64 {
        match resource {
            Resource::Cpu => self.cpu,
            Resource::Memory => self.memory,
            Resource::Disk => self.disk,
        }
    }

    /// Returns the first resource whose threshold is outside `[0, 100]`.
    pub fn first_out_of_range(&self) -> Option<(Resource, f64)> {
        Resource::ALL
            .into_iter()
            .map(|r| (r, self.get(r)))
            .find(|(_, v)| !v.is_finite() || !(0.0..=100.0).contains(v))
    }
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            cpu: Self::DEFAULT_PERCENT,
            memory: Self::DEFAULT_PERCENT,
            disk: Self::DEFAULT_PERCENT,
        }
    }
}

/// The alert configuration aggregate: thresholds plus the global on/off flag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlertConfig {
    #[serde(rename = "enable_alerts")]
    pub enabled: bool,
    #[serde(flatten)]
    pub thresholds: ThresholdSet,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            thresholds: ThresholdSet::default(),
        }
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Queries the operating system for utilization percentages.
///
/// Every call is a fresh, blocking query. Async callers should run these on
/// the blocking thread pool.
pub trait MetricProvider: Send + Sync {
    fn cpu_percent(&self) -> Measurement;

    fn memory_percent(&self) -> Measurement;

    /// Utilization of the primary volume.
    fn disk_percent(&self) -> Measurement;

    /// Queries all three resources sequentially.
    fn sample(&self) -> ResourceUsage {
        ResourceUsage {
            cpu: self.cpu_percent(),
            memory: self.memory_percent(),
            disk: self.disk_percent(),
        }
    }
}

/// Delivers a human-visible alert.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A short name for the backend (e.g., "desktop", "log").
    fn name(&self) -> &str;

    /// Sends a notification with the given title and message.
    ///
    /// # Returns
    /// * `Ok(())` if the notification was handed to the backend
    /// * `Err` if delivery failed; callers log and drop the error
    async fn notify(&self, title: &str, message: &str) -> Result<()>;
}
