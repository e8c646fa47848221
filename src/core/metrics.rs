use crate::domain::model::MetricsSnapshot;
use crate::utils::monitor::ProcessMonitor;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Request counters shared by every handler through the router state.
pub struct RequestMetrics {
    requests_total: AtomicU64,
    latency_micros_total: AtomicU64,
    started_at: DateTime<Utc>,
    monitor: ProcessMonitor,
}

impl RequestMetrics {
    pub fn new(monitor: ProcessMonitor) -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            latency_micros_total: AtomicU64::new(0),
            started_at: Utc::now(),
            monitor,
        }
    }

    pub fn record(&self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.latency_micros_total.fetch_add(micros, Ordering::Relaxed);
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn average_latency_ms(&self) -> f64 {
        let requests = self.requests_total();
        if requests == 0 {
            return 0.0;
        }
        let total_ms = self.latency_micros_total.load(Ordering::Relaxed) as f64 / 1000.0;
        total_ms / requests as f64
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let now = Utc::now();
        MetricsSnapshot {
            requests_total: self.requests_total(),
            // 尚未接 GPU 量測
            gpu_utilization: 0.0,
            average_latency_ms: self.average_latency_ms(),
            started_at: self.started_at,
            uptime_secs: (now - self.started_at).num_seconds(),
            process: self.monitor.get_stats(),
        }
    }

    pub fn monitor(&self) -> &ProcessMonitor {
        &self.monitor
    }
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new(ProcessMonitor::new(false))
    }
}
