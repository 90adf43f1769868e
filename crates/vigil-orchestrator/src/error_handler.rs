//! Error handler: classifies a `VigilError` into one of the seven kinds,
//! attaches a recovery action, retains a bounded ring of records, and
//! emits through an injected `ErrorSink` — never a direct reference to the
//! broadcaster, which would create a dependency cycle.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;
use vigil_common::{Clock, VigilError};
use vigil_model::{ErrorRecord, ErrorSeverity, ErrorSink};

const DEFAULT_RING_CAPACITY: usize = 500;

fn severity_for(error: &VigilError) -> ErrorSeverity {
    match error {
        VigilError::Internal { .. } => ErrorSeverity::Critical,
        VigilError::Storage { .. } => ErrorSeverity::High,
        VigilError::Validation { .. } | VigilError::Parsing { .. } => ErrorSeverity::Medium,
        VigilError::Analysis { .. } | VigilError::Notification { .. } | VigilError::Broadcast { .. } => {
            ErrorSeverity::Low
        }
    }
}

fn entry_id_of(error: &VigilError) -> Option<Uuid> {
    match error {
        VigilError::Validation { entry_id, .. }
        | VigilError::Storage { entry_id, .. }
        | VigilError::Internal { entry_id, .. } => Some(*entry_id),
        VigilError::Parsing { entry_id } => Some(*entry_id),
        _ => None,
    }
}

pub struct ErrorHandler {
    ring: Mutex<VecDeque<ErrorRecord>>,
    capacity: usize,
    sink: Arc<dyn ErrorSink>,
    clock: Arc<dyn Clock>,
}

impl ErrorHandler {
    pub fn new(sink: Arc<dyn ErrorSink>, clock: Arc<dyn Clock>) -> Self {
        Self::with_capacity(sink, clock, DEFAULT_RING_CAPACITY)
    }

    pub fn with_capacity(sink: Arc<dyn ErrorSink>, clock: Arc<dyn Clock>, capacity: usize) -> Self {
        Self {
            ring: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            sink,
            clock,
        }
    }

    /// Classify, record, and emit `error`. Returns the recovery action the
    /// caller should apply.
    pub async fn handle(&self, error: VigilError, correlation_id: Uuid) -> vigil_common::RecoveryAction {
        let recovery_action = error.recovery_action();
        let record = ErrorRecord {
            kind: error.kind_name(),
            severity: severity_for(&error),
            message: error.to_string(),
            entry_id: entry_id_of(&error),
            correlation_id,
            recovery_action,
            occurred_at: self.clock.now(),
        };

        {
            let mut ring = self.ring.lock();
            if ring.len() >= self.capacity {
                ring.pop_front();
            }
            ring.push_back(record.clone());
        }

        tracing::warn!(
            kind = record.kind,
            entry_id = ?record.entry_id,
            recovery = ?record.recovery_action,
            "{}",
            record.message
        );

        self.sink.emit_error(&record).await;
        recovery_action
    }

    pub fn recent_errors(&self) -> Vec<ErrorRecord> {
        self.ring.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vigil_common::SystemClock;

    struct CountingSink(AtomicUsize);

    #[async_trait]
    impl ErrorSink for CountingSink {
        async fn emit_error(&self, _record: &ErrorRecord) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[tokio::test]
    async fn classifies_and_emits() {
        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let handler = ErrorHandler::new(sink.clone(), Arc::new(SystemClock));

        let action = handler
            .handle(
                VigilError::Validation { entry_id: Uuid::new_v4(), reason: "empty".into() },
                Uuid::new_v4(),
            )
            .await;
        assert_eq!(action, vigil_common::RecoveryAction::None);
        assert_eq!(sink.0.load(Ordering::Relaxed), 1);
        assert_eq!(handler.recent_errors().len(), 1);
    }

    #[tokio::test]
    async fn ring_evicts_oldest_on_overflow() {
        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let handler = ErrorHandler::with_capacity(sink, Arc::new(SystemClock), 2);

        for _ in 0..3 {
            handler
                .handle(VigilError::Broadcast { reason: "x".into() }, Uuid::new_v4())
                .await;
        }
        assert_eq!(handler.recent_errors().len(), 2);
    }
}
