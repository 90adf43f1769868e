//! Result broadcaster: fans final processing outcomes and error
//! notifications out to registered observers, with per-source throttling
//! on repeated non-urgent results.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use uuid::Uuid;
use vigil_common::{Clock, Value};
use vigil_model::{
    BroadcastEnvelope, BroadcastPriority, ErrorRecord, ErrorSeverity, ErrorSink, LogEntryStatus,
    MessageType, Observer, ProcessingResult, ValidationVerdict,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultType {
    Success,
    PartialSuccess,
    Failure,
    Warning,
    Info,
}

impl ResultType {
    fn from_result(result: &ProcessingResult) -> Self {
        if !result.success {
            ResultType::Failure
        } else if !result.errors.is_empty() {
            ResultType::PartialSuccess
        } else if !result.warnings.is_empty() {
            ResultType::Warning
        } else {
            ResultType::Success
        }
    }

    /// FAILURE and PARTIAL_SUCCESS never throttle.
    fn never_throttles(self) -> bool {
        matches!(self, ResultType::Failure | ResultType::PartialSuccess)
    }

    fn as_str(self) -> &'static str {
        match self {
            ResultType::Success => "success",
            ResultType::PartialSuccess => "partial_success",
            ResultType::Failure => "failure",
            ResultType::Warning => "warning",
            ResultType::Info => "info",
        }
    }
}

fn derive_priority(result: &ProcessingResult, result_type: ResultType) -> BroadcastPriority {
    match result_type {
        ResultType::Failure => BroadcastPriority::High,
        ResultType::PartialSuccess => BroadcastPriority::Medium,
        ResultType::Warning => BroadcastPriority::Medium,
        _ if result.validation_result == ValidationVerdict::Suspicious => BroadcastPriority::Medium,
        _ => BroadcastPriority::Low,
    }
}

#[derive(Debug, Default, Clone)]
pub struct BroadcastStats {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub total_clients_reached: u64,
}

struct StatsInner {
    total: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    total_clients_reached: AtomicU64,
}

impl Default for StatsInner {
    fn default() -> Self {
        Self {
            total: AtomicU64::new(0),
            successful: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            total_clients_reached: AtomicU64::new(0),
        }
    }
}

/// Delivers typed status envelopes to every registered observer with
/// priority and per-`(source, result_type)` throttling.
pub struct Broadcaster {
    observers: RwLock<Vec<Arc<dyn Observer>>>,
    throttle_rules: DashMap<String, ChronoDuration>,
    last_broadcast: DashMap<String, DateTime<Utc>>,
    stats: StatsInner,
    clock: Arc<dyn Clock>,
}

impl Broadcaster {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
            throttle_rules: DashMap::new(),
            last_broadcast: DashMap::new(),
            stats: StatsInner::default(),
            clock,
        }
    }

    pub fn register_observer(&self, observer: Arc<dyn Observer>) {
        self.observers.write().push(observer);
    }

    /// Configure a minimum interval between broadcasts sharing
    /// `(source_name, result_type)`.
    pub fn set_throttle(&self, source_name: &str, result_type: ResultType, min_interval: ChronoDuration) {
        self.throttle_rules
            .insert(throttle_key(source_name, result_type), min_interval);
    }

    pub fn stats(&self) -> BroadcastStats {
        BroadcastStats {
            total: self.stats.total.load(Ordering::Relaxed),
            successful: self.stats.successful.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
            total_clients_reached: self.stats.total_clients_reached.load(Ordering::Relaxed),
        }
    }

    async fn deliver(&self, envelope: BroadcastEnvelope) -> usize {
        let observers = self.observers.read().clone();
        for observer in &observers {
            observer.on_message(&envelope).await;
        }
        self.stats.total.fetch_add(1, Ordering::Relaxed);
        self.stats.successful.fetch_add(1, Ordering::Relaxed);
        self.stats
            .total_clients_reached
            .fetch_add(observers.len() as u64, Ordering::Relaxed);
        observers.len()
    }

    fn should_throttle(&self, source_name: &str, result_type: ResultType) -> bool {
        if result_type.never_throttles() {
            return false;
        }
        let key = throttle_key(source_name, result_type);
        let Some(min_interval) = self.throttle_rules.get(&key) else {
            return false;
        };
        let Some(last) = self.last_broadcast.get(&key) else {
            return false;
        };
        self.clock.now() - *last < *min_interval
    }

    fn mark_broadcast(&self, source_name: &str, result_type: ResultType) {
        self.last_broadcast
            .insert(throttle_key(source_name, result_type), self.clock.now());
    }

    pub async fn broadcast_processing_status(&self, entry_id: Uuid, source_name: &str, status: LogEntryStatus) -> usize {
        let priority = match status {
            LogEntryStatus::Failed => BroadcastPriority::High,
            LogEntryStatus::Processing => BroadcastPriority::Medium,
            _ => BroadcastPriority::Low,
        };
        let mut data = BTreeMap::new();
        data.insert("status".to_string(), Value::Str(format!("{status:?}")));
        let envelope = BroadcastEnvelope {
            message_id: self.clock.new_id(),
            message_type: MessageType::ProcessingStatus,
            priority,
            timestamp: self.clock.now(),
            entry_id: Some(entry_id),
            source_name: Some(source_name.to_string()),
            data,
        };
        self.deliver(envelope).await
    }

    /// Broadcast a final `processing_result`, honoring per-`(source,
    /// result_type)` throttling.
    pub async fn broadcast_processing_result(&self, entry_id: Uuid, source_name: &str, result: &ProcessingResult) -> usize {
        let result_type = ResultType::from_result(result);

        if self.should_throttle(source_name, result_type) {
            tracing::debug!(%entry_id, source_name, ?result_type, "processing result throttled");
            return 0;
        }

        let priority = derive_priority(result, result_type);
        let mut data = BTreeMap::new();
        data.insert("result_type".to_string(), Value::Str(result_type.as_str().to_string()));
        data.insert("success".to_string(), Value::Bool(result.success));
        data.insert(
            "validation_result".to_string(),
            Value::Str(format!("{:?}", result.validation_result)),
        );
        data.insert("sanitized".to_string(), Value::Bool(result.sanitized));
        if !result.errors.is_empty() {
            data.insert(
                "errors".to_string(),
                Value::List(result.errors.iter().map(|e| Value::Str(e.clone())).collect()),
            );
        }
        if !result.warnings.is_empty() {
            data.insert(
                "warnings".to_string(),
                Value::List(result.warnings.iter().map(|w| Value::Str(w.clone())).collect()),
            );
        }

        let envelope = BroadcastEnvelope {
            message_id: self.clock.new_id(),
            message_type: MessageType::ProcessingResult,
            priority,
            timestamp: self.clock.now(),
            entry_id: Some(entry_id),
            source_name: Some(source_name.to_string()),
            data,
        };
        let reached = self.deliver(envelope).await;
        self.mark_broadcast(source_name, result_type);
        reached
    }

    pub async fn broadcast_system_status(&self, message: &str, priority: BroadcastPriority) -> usize {
        let mut data = BTreeMap::new();
        data.insert("message".to_string(), Value::Str(message.to_string()));
        let envelope = BroadcastEnvelope {
            message_id: self.clock.new_id(),
            message_type: MessageType::SystemStatusUpdate,
            priority,
            timestamp: self.clock.now(),
            entry_id: None,
            source_name: None,
            data,
        };
        self.deliver(envelope).await
    }

    pub async fn broadcast_notification_status(&self, entry_id: Uuid, channel_id: &str, success: bool) -> usize {
        let mut data = BTreeMap::new();
        data.insert("channel_id".to_string(), Value::Str(channel_id.to_string()));
        data.insert("success".to_string(), Value::Bool(success));
        let envelope = BroadcastEnvelope {
            message_id: self.clock.new_id(),
            message_type: MessageType::NotificationStatus,
            priority: BroadcastPriority::Low,
            timestamp: self.clock.now(),
            entry_id: Some(entry_id),
            source_name: None,
            data,
        };
        self.deliver(envelope).await
    }
}

fn throttle_key(source_name: &str, result_type: ResultType) -> String {
    format!("{}_{}", source_name, result_type.as_str())
}

#[async_trait]
impl ErrorSink for Broadcaster {
    /// `error_notification` broadcasts: MEDIUM by default, bumped to
    /// CRITICAL/HIGH for matching severities.
    async fn emit_error(&self, record: &ErrorRecord) {
        let priority = match record.severity {
            ErrorSeverity::Critical => BroadcastPriority::Critical,
            ErrorSeverity::High => BroadcastPriority::High,
            _ => BroadcastPriority::Medium,
        };
        let mut data = BTreeMap::new();
        data.insert("kind".to_string(), Value::Str(record.kind.to_string()));
        data.insert("message".to_string(), Value::Str(record.message.clone()));
        data.insert(
            "recovery_action".to_string(),
            Value::Str(format!("{:?}", record.recovery_action)),
        );
        let envelope = BroadcastEnvelope {
            message_id: record.correlation_id,
            message_type: MessageType::ErrorNotification,
            priority,
            timestamp: record.occurred_at,
            entry_id: record.entry_id,
            source_name: None,
            data,
        };
        self.deliver(envelope).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration as StdDuration;
    use vigil_common::SystemClock;

    struct CountingObserver(Arc<AtomicUsize>);

    #[async_trait]
    impl Observer for CountingObserver {
        async fn on_message(&self, _envelope: &BroadcastEnvelope) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn success_result(entry_id: Uuid) -> ProcessingResult {
        ProcessingResult {
            entry_id,
            success: true,
            processing_time: StdDuration::from_millis(5),
            validation_result: ValidationVerdict::Valid,
            sanitized: false,
            errors: Vec::new(),
            warnings: Vec::new(),
            metadata: Default::default(),
        }
    }

    #[tokio::test]
    async fn delivers_to_all_observers() {
        let broadcaster = Broadcaster::new(Arc::new(SystemClock));
        let count = Arc::new(AtomicUsize::new(0));
        broadcaster.register_observer(Arc::new(CountingObserver(count.clone())));
        broadcaster.register_observer(Arc::new(CountingObserver(count.clone())));

        let entry_id = Uuid::new_v4();
        let reached = broadcaster
            .broadcast_processing_result(entry_id, "host1", &success_result(entry_id))
            .await;
        assert_eq!(reached, 2);
        assert_eq!(count.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn failure_never_throttles() {
        let broadcaster = Broadcaster::new(Arc::new(SystemClock));
        broadcaster.set_throttle("host1", ResultType::Failure, ChronoDuration::hours(1));

        let entry_id = Uuid::new_v4();
        let mut failing = success_result(entry_id);
        failing.success = false;

        let first = broadcaster.broadcast_processing_result(entry_id, "host1", &failing).await;
        let second = broadcaster.broadcast_processing_result(entry_id, "host1", &failing).await;
        assert_eq!(first, 0);
        assert_eq!(second, 0);
        assert_eq!(broadcaster.stats().total, 2);
    }

    #[tokio::test]
    async fn success_throttles_within_window() {
        let broadcaster = Broadcaster::new(Arc::new(SystemClock));
        broadcaster.set_throttle("host1", ResultType::Success, ChronoDuration::hours(1));

        let entry_id = Uuid::new_v4();
        broadcaster
            .broadcast_processing_result(entry_id, "host1", &success_result(entry_id))
            .await;
        let reached = broadcaster
            .broadcast_processing_result(entry_id, "host1", &success_result(entry_id))
            .await;
        assert_eq!(reached, 0);
    }
}
