//! Request counters and latency statistics for the prediction service.

use crate::types::prediction::SleepDisorder;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for the HTTP service
pub struct ServiceMetrics {
    /// Successful predictions
    pub predictions_served: AtomicU64,
    /// Submissions rejected by form validation
    pub validation_failures: AtomicU64,
    /// Predictions that failed in the model or its output mapping
    pub prediction_failures: AtomicU64,
    /// PDF reports delivered
    pub reports_rendered: AtomicU64,
    /// Report renders that failed
    pub render_failures: AtomicU64,
    /// Predictions by label
    predictions_by_label: RwLock<HashMap<SleepDisorder, u64>>,
    /// Prediction latencies (in microseconds)
    prediction_times: RwLock<Vec<u64>>,
    /// Start time for uptime and rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            prediction_failures: AtomicU64::new(0),
            reports_rendered: AtomicU64::new(0),
            render_failures: AtomicU64::new(0),
            predictions_by_label: RwLock::new(HashMap::new()),
            prediction_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, elapsed: Duration, label: SleepDisorder) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.prediction_times.write() {
            times.push(elapsed.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        if let Ok(mut by_label) = self.predictions_by_label.write() {
            *by_label.entry(label).or_insert(0) += 1;
        }
    }

    pub fn record_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prediction_failure(&self) {
        self.prediction_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_report(&self) {
        self.reports_rendered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_render_failure(&self) {
        self.render_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get prediction latency statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let Ok(times) = self.prediction_times.read() else {
            return ProcessingStats::default();
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: sorted[count - 1],
        }
    }

    /// Get predictions by label, keyed by label text
    pub fn get_predictions_by_label(&self) -> HashMap<&'static str, u64> {
        self.predictions_by_label
            .read()
            .map(|by_label| by_label.iter().map(|(k, v)| (k.label(), *v)).collect())
            .unwrap_or_default()
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.uptime().as_secs(),
            predictions_served: self.predictions_served.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            prediction_failures: self.prediction_failures.load(Ordering::Relaxed),
            reports_rendered: self.reports_rendered.load(Ordering::Relaxed),
            render_failures: self.render_failures.load(Ordering::Relaxed),
            predictions_by_label: self.get_predictions_by_label(),
            latency: self.get_processing_stats(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let latency = &snapshot.latency;

        info!(
            uptime_secs = snapshot.uptime_secs,
            predictions = snapshot.predictions_served,
            validation_failures = snapshot.validation_failures,
            prediction_failures = snapshot.prediction_failures,
            reports = snapshot.reports_rendered,
            render_failures = snapshot.render_failures,
            "Service metrics summary"
        );
        if latency.count > 0 {
            info!(
                mean_us = latency.mean_us,
                p50_us = latency.p50_us,
                p95_us = latency.p95_us,
                p99_us = latency.p99_us,
                max_us = latency.max_us,
                "Prediction latency"
            );
        }
        for disorder in SleepDisorder::ALL {
            let count = snapshot
                .predictions_by_label
                .get(disorder.label())
                .copied()
                .unwrap_or(0);
            info!(label = %disorder, count = count, "Predictions by label");
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Serializable view of [`ServiceMetrics`]
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub predictions_served: u64,
    pub validation_failures: u64,
    pub prediction_failures: u64,
    pub reports_rendered: u64,
    pub render_failures: u64,
    pub predictions_by_label: HashMap<&'static str, u64>,
    pub latency: ProcessingStats,
}

/// Periodic metrics reporter that logs summaries
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // the first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
