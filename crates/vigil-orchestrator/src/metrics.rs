//! Pipeline metrics: atomic counters plus a capped rolling window, with
//! rates derived on demand rather than maintained incrementally.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use vigil_model::ValidationVerdict;

const ROLLING_WINDOW_CAP: usize = 500;

#[derive(Debug, Clone, Default)]
pub struct ProcessingTimeStats {
    pub min_ms: u64,
    pub max_ms: u64,
    pub avg_ms: f64,
    pub sample_count: u64,
}

#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub entries_processed: u64,
    pub parsed: u64,
    pub analyzed: u64,
    pub failed: u64,
    pub retried: u64,
    pub valid: u64,
    pub repairable: u64,
    pub suspicious: u64,
    pub invalid: u64,
    pub sanitized: u64,
    pub notifications_triggered: u64,
    pub notifications_sent: u64,
    pub notifications_failed: u64,
    pub processing_time: ProcessingTimeStats,
    pub uptime: Duration,
    pub entries_per_second: f64,
    pub success_rate: f64,
}

/// Counters and rolling window for one orchestrator instance.
pub struct PipelineMetrics {
    started_at: Instant,
    entries_processed: AtomicU64,
    parsed: AtomicU64,
    analyzed: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
    valid: AtomicU64,
    repairable: AtomicU64,
    suspicious: AtomicU64,
    invalid: AtomicU64,
    sanitized: AtomicU64,
    notifications_triggered: AtomicU64,
    notifications_sent: AtomicU64,
    notifications_failed: AtomicU64,
    processing_times: RwLock<VecDeque<u64>>,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            entries_processed: AtomicU64::new(0),
            parsed: AtomicU64::new(0),
            analyzed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            retried: AtomicU64::new(0),
            valid: AtomicU64::new(0),
            repairable: AtomicU64::new(0),
            suspicious: AtomicU64::new(0),
            invalid: AtomicU64::new(0),
            sanitized: AtomicU64::new(0),
            notifications_triggered: AtomicU64::new(0),
            notifications_sent: AtomicU64::new(0),
            notifications_failed: AtomicU64::new(0),
            processing_times: RwLock::new(VecDeque::with_capacity(ROLLING_WINDOW_CAP)),
        }
    }

    pub fn record_entry_processed(&self, success: bool, duration: Duration) {
        self.entries_processed.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        let mut window = self.processing_times.write();
        if window.len() >= ROLLING_WINDOW_CAP {
            window.pop_front();
        }
        window.push_back(duration.as_millis() as u64);
    }

    pub fn record_parsed(&self, count: u64) {
        self.parsed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_analyzed(&self) {
        self.analyzed.fetch_add(1, Ordering::Relaxed);
    }

    /// Incremented exactly once per retry attempt, not also on the entry's
    /// final outcome.
    pub fn record_retry(&self) {
        self.retried.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation(&self, verdict: ValidationVerdict) {
        match verdict {
            ValidationVerdict::Valid => self.valid.fetch_add(1, Ordering::Relaxed),
            ValidationVerdict::Repairable => self.repairable.fetch_add(1, Ordering::Relaxed),
            ValidationVerdict::Suspicious => self.suspicious.fetch_add(1, Ordering::Relaxed),
            ValidationVerdict::Invalid => self.invalid.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn record_sanitized(&self) {
        self.sanitized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_notification_triggered(&self) {
        self.notifications_triggered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_notification_outcome(&self, sent: usize, failed: usize) {
        self.notifications_sent.fetch_add(sent as u64, Ordering::Relaxed);
        self.notifications_failed.fetch_add(failed as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let window = self.processing_times.read();
        let processing_time = if window.is_empty() {
            ProcessingTimeStats::default()
        } else {
            let sum: u64 = window.iter().sum();
            ProcessingTimeStats {
                min_ms: *window.iter().min().unwrap(),
                max_ms: *window.iter().max().unwrap(),
                avg_ms: sum as f64 / window.len() as f64,
                sample_count: window.len() as u64,
            }
        };

        let entries_processed = self.entries_processed.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let uptime = self.started_at.elapsed();
        let uptime_secs = uptime.as_secs_f64().max(f64::EPSILON);

        MetricsSnapshot {
            entries_processed,
            parsed: self.parsed.load(Ordering::Relaxed),
            analyzed: self.analyzed.load(Ordering::Relaxed),
            failed,
            retried: self.retried.load(Ordering::Relaxed),
            valid: self.valid.load(Ordering::Relaxed),
            repairable: self.repairable.load(Ordering::Relaxed),
            suspicious: self.suspicious.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            sanitized: self.sanitized.load(Ordering::Relaxed),
            notifications_triggered: self.notifications_triggered.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent.load(Ordering::Relaxed),
            notifications_failed: self.notifications_failed.load(Ordering::Relaxed),
            processing_time,
            uptime,
            entries_per_second: entries_processed as f64 / uptime_secs,
            success_rate: if entries_processed > 0 {
                (entries_processed - failed) as f64 / entries_processed as f64
            } else {
                1.0
            },
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_metrics_has_perfect_success_rate() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.snapshot().success_rate, 1.0);
    }

    #[test]
    fn records_processing_time_window() {
        let metrics = PipelineMetrics::new();
        metrics.record_entry_processed(true, Duration::from_millis(100));
        metrics.record_entry_processed(true, Duration::from_millis(300));
        let snap = metrics.snapshot();
        assert_eq!(snap.processing_time.min_ms, 100);
        assert_eq!(snap.processing_time.max_ms, 300);
        assert_eq!(snap.processing_time.sample_count, 2);
    }

    #[test]
    fn rolling_window_is_capped() {
        let metrics = PipelineMetrics::new();
        for _ in 0..(ROLLING_WINDOW_CAP + 50) {
            metrics.record_entry_processed(true, Duration::from_millis(1));
        }
        assert_eq!(metrics.snapshot().processing_time.sample_count, ROLLING_WINDOW_CAP as u64);
    }

    #[test]
    fn failure_lowers_success_rate() {
        let metrics = PipelineMetrics::new();
        metrics.record_entry_processed(true, Duration::from_millis(1));
        metrics.record_entry_processed(false, Duration::from_millis(1));
        assert_eq!(metrics.snapshot().success_rate, 0.5);
    }
}
