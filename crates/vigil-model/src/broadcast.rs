//! Wire payload shapes for broadcaster messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use vigil_common::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BroadcastPriority {
    Debug = 1,
    Low = 3,
    Medium = 5,
    High = 8,
    Critical = 10,
}

impl BroadcastPriority {
    pub fn weight(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    ProcessingStatus,
    ProcessingResult,
    ErrorNotification,
    SystemStatusUpdate,
    NotificationStatus,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::ProcessingStatus => "processing_status",
            MessageType::ProcessingResult => "processing_result",
            MessageType::ErrorNotification => "error_notification",
            MessageType::SystemStatusUpdate => "system_status_update",
            MessageType::NotificationStatus => "notification_status",
        }
    }
}

/// Envelope `{message_id, type, priority, timestamp, data}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastEnvelope {
    pub message_id: Uuid,
    pub message_type: MessageType,
    pub priority: BroadcastPriority,
    pub timestamp: DateTime<Utc>,
    pub entry_id: Option<Uuid>,
    pub source_name: Option<String>,
    pub data: BTreeMap<String, Value>,
}
