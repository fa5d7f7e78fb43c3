//! System usage telemetry
//!
//! One background worker samples CPU and memory usage on an interval and
//! maintains a running CPU average. The latest snapshot is surfaced by
//! the web server's metrics route.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use sysinfo::System;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Default seconds between samples
pub const DEFAULT_SAMPLE_INTERVAL_SECS: u64 = 30;

/// Point-in-time system usage
#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemUsage {
    /// Running average of global CPU busy percentage
    pub cpu_busy_avg: f64,
    /// Bytes of memory in use
    pub memory_used_bytes: u64,
    /// Total bytes of memory
    pub memory_total_bytes: u64,
    /// Number of samples contributing to the average
    pub samples: u64,
}

/// Samples system usage on a background worker
pub struct TelemetrySampler {
    usage: RwLock<SystemUsage>,
    interval_secs: u64,
}

impl TelemetrySampler {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            usage: RwLock::new(SystemUsage::default()),
            interval_secs: interval_secs.max(1),
        }
    }

    /// Latest usage snapshot.
    pub fn snapshot(&self) -> SystemUsage {
        self.usage.read().clone()
    }

    /// Start the sampling worker; it exits on the shutdown signal.
    pub fn start(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let sampler = Arc::clone(self);
        info!(interval_secs = sampler.interval_secs, "starting CPU usage sampler");

        tokio::spawn(async move {
            let mut system = System::new();
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(sampler.interval_secs)) => {
                        system.refresh_cpu_usage();
                        system.refresh_memory();
                        sampler.record(
                            system.global_cpu_usage() as f64,
                            system.used_memory(),
                            system.total_memory(),
                        );
                    }
                    _ = shutdown.changed() => {
                        info!("exiting CPU usage sampler");
                        return;
                    }
                }
            }
        })
    }

    fn record(&self, cpu_busy: f64, memory_used: u64, memory_total: u64) {
        let mut usage = self.usage.write();
        let samples = usage.samples + 1;
        usage.cpu_busy_avg =
            (usage.cpu_busy_avg * usage.samples as f64 + cpu_busy) / samples as f64;
        usage.samples = samples;
        usage.memory_used_bytes = memory_used;
        usage.memory_total_bytes = memory_total;
        debug!(cpu_busy_avg = usage.cpu_busy_avg, samples, "telemetry sample recorded");
    }
}
