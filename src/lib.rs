/// SysGuard - A local resource monitor with desktop alerts
///
/// This library samples CPU, memory and disk utilization in the background,
/// raises a desktop notification when a reading crosses its threshold, and
/// serves readings and alert settings over a small HTTP API.
pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod internal_metrics;
pub mod notification;
pub mod sampler;
pub mod store;
pub mod system;
pub mod task_manager;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export core types for convenience
pub use crate::core::*;
