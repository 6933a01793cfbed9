//! # System Metric Provider
//!
//! This module defines `SystemMetricProvider`, the production implementation
//! of [`MetricProvider`]. It queries the host through the `sysinfo` crate for
//! global CPU usage, physical memory usage, and usage of a single mounted
//! volume.
//!
//! CPU usage is computed by `sysinfo` as the delta between two refreshes, so
//! the provider keeps its `System` alive between calls and primes it once at
//! construction. The first reading after start-up may therefore be low.

use crate::core::{Measurement, MetricProvider, Resource};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use sysinfo::{Disks, System};
use tracing::{debug, warn};

/// Queries the local machine for utilization percentages.
pub struct SystemMetricProvider {
    system: Mutex<System>,
    disks: Mutex<Disks>,
    mount_point: PathBuf,
}

impl SystemMetricProvider {
    /// Creates a provider that reports disk usage for the volume mounted at
    /// `mount_point`.
    pub fn new(mount_point: impl Into<PathBuf>) -> Self {
        let mut system = System::new();
        system.refresh_cpu();
        Self {
            system: Mutex::new(system),
            disks: Mutex::new(Disks::new_with_refreshed_list()),
            mount_point: mount_point.into(),
        }
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    fn system(&self) -> MutexGuard<'_, System> {
        self.system.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn failed(resource: Resource, reason: &str) -> Measurement {
        warn!(resource = %resource, "Error getting {} usage: {}", resource, reason);
        Measurement::Failed
    }

    /// Turns a raw percentage into a measurement, logging non-finite values.
    fn reading(resource: Resource, percent: f64) -> Measurement {
        if !percent.is_finite() {
            return Self::failed(resource, &format!("non-finite reading {}", percent));
        }
        Measurement::from_percent(percent)
    }
}

impl MetricProvider for SystemMetricProvider {
    fn cpu_percent(&self) -> Measurement {
        let mut system = self.system();
        system.refresh_cpu();
        if system.cpus().is_empty() {
            return Self::failed(Resource::Cpu, "no CPUs reported");
        }
        Self::reading(Resource::Cpu, system.global_cpu_info().cpu_usage() as f64)
    }

    fn memory_percent(&self) -> Measurement {
        let mut system = self.system();
        system.refresh_memory();
        let total = system.total_memory();
        if total == 0 {
            return Self::failed(Resource::Memory, "total memory reported as zero");
        }
        Self::reading(
            Resource::Memory,
            system.used_memory() as f64 / total as f64 * 100.0,
        )
    }

    fn disk_percent(&self) -> Measurement {
        let mut disks = self.disks.lock().unwrap_or_else(|p| p.into_inner());
        // Volumes can be mounted or unmounted while we run.
        disks.refresh_list();

        let Some(disk) = disks
            .list()
            .iter()
            .find(|d| d.mount_point() == self.mount_point.as_path())
        else {
            return Self::failed(
                Resource::Disk,
                &format!("no volume mounted at {}", self.mount_point.display()),
            );
        };

        let total = disk.total_space();
        if total == 0 {
            return Self::failed(Resource::Disk, "volume reports zero capacity");
        }
        let used = total.saturating_sub(disk.available_space());
        debug!(mount_point = %self.mount_point.display(), total, used, "Disk usage queried");
        Self::reading(Resource::Disk, used as f64 / total as f64 * 100.0)
    }
}
