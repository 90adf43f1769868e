//! `LogEntry`: the unit of work flowing through the ingestion queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vigil_common::{metadata_keys, Metadata, Value};

/// Priority ordering, heaviest first. Weights match `BroadcastPriority`
/// so the whole crate shares one notion of "how urgent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogEntryPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl LogEntryPriority {
    pub fn weight(self) -> i32 {
        match self {
            LogEntryPriority::Low => 3,
            LogEntryPriority::Medium => 5,
            LogEntryPriority::High => 8,
            LogEntryPriority::Critical => 10,
        }
    }

    pub fn is_urgent(self) -> bool {
        matches!(self, LogEntryPriority::High | LogEntryPriority::Critical)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogEntryStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Retrying,
    Dead,
}

impl LogEntryStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LogEntryStatus::Completed | LogEntryStatus::Failed | LogEntryStatus::Dead
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub entry_id: Uuid,
    pub content: String,
    pub source_path: Option<String>,
    pub source_name: String,
    pub timestamp: DateTime<Utc>,
    pub priority: LogEntryPriority,
    pub file_offset: Option<u64>,
    pub status: LogEntryStatus,
    pub created_at: DateTime<Utc>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub processing_completed_at: Option<DateTime<Utc>>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub last_error: Option<String>,
    pub error_count: u32,
    pub metadata: Metadata,
}

impl LogEntry {
    pub fn new(
        id: Uuid,
        now: DateTime<Utc>,
        content: impl Into<String>,
        source_path: Option<String>,
        source_name: impl Into<String>,
        priority: LogEntryPriority,
        max_retries: u32,
    ) -> Self {
        Self {
            entry_id: id,
            content: content.into(),
            source_path,
            source_name: source_name.into(),
            timestamp: now,
            priority,
            file_offset: None,
            status: LogEntryStatus::Pending,
            created_at: now,
            processing_started_at: None,
            processing_completed_at: None,
            retry_count: 0,
            max_retries,
            last_error: None,
            error_count: 0,
            metadata: Metadata::new(),
        }
    }

    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Transition to a new status. Terminal statuses refuse further
    /// transitions, enforcing the invariant that COMPLETED/FAILED/DEAD are
    /// final.
    pub fn transition(&mut self, new_status: LogEntryStatus, now: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        match new_status {
            LogEntryStatus::Processing => self.processing_started_at.get_or_insert(now),
            LogEntryStatus::Completed | LogEntryStatus::Failed | LogEntryStatus::Dead => {
                self.processing_completed_at.get_or_insert(now)
            }
            _ => &now,
        };
        self.status = new_status;
        true
    }

    pub fn record_error(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
        self.error_count += 1;
    }

    pub fn mark_sanitized(
        &mut self,
        original_length: usize,
        sanitized_length: usize,
        now: DateTime<Utc>,
    ) {
        self.metadata
            .insert(metadata_keys::SANITIZED.to_string(), Value::Bool(true));
        self.metadata.insert(
            metadata_keys::ORIGINAL_LENGTH.to_string(),
            Value::Int(original_length as i64),
        );
        self.metadata.insert(
            metadata_keys::SANITIZED_LENGTH.to_string(),
            Value::Int(sanitized_length as i64),
        );
        self.metadata.insert(
            metadata_keys::SANITIZED_AT.to_string(),
            Value::Timestamp(now),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_status_refuses_transitions() {
        let now = Utc::now();
        let mut entry = LogEntry::new(
            Uuid::new_v4(),
            now,
            "hello",
            None,
            "test",
            LogEntryPriority::Medium,
            3,
        );
        assert!(entry.transition(LogEntryStatus::Completed, now));
        assert!(!entry.transition(LogEntryStatus::Processing, now));
        assert_eq!(entry.status, LogEntryStatus::Completed);
    }

    #[test]
    fn priority_weights_are_strictly_ordered() {
        assert!(LogEntryPriority::Critical.weight() > LogEntryPriority::High.weight());
        assert!(LogEntryPriority::High.weight() > LogEntryPriority::Medium.weight());
        assert!(LogEntryPriority::Medium.weight() > LogEntryPriority::Low.weight());
    }
}
