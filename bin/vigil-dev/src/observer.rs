//! A stdout `Observer`, standing in for the websocket/SSE fan-out a report-
//! rendering surface would own outside the core.

use async_trait::async_trait;
use tracing::info;
use vigil_model::{BroadcastEnvelope, Observer};

pub struct StdoutObserver;

#[async_trait]
impl Observer for StdoutObserver {
    async fn on_message(&self, envelope: &BroadcastEnvelope) {
        info!(
            message_type = envelope.message_type.as_str(),
            priority = ?envelope.priority,
            entry_id = ?envelope.entry_id,
            source = ?envelope.source_name,
            "broadcast"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;
    use vigil_model::{BroadcastPriority, MessageType};

    #[tokio::test]
    async fn on_message_does_not_panic() {
        let observer = StdoutObserver;
        let envelope = BroadcastEnvelope {
            message_id: Uuid::new_v4(),
            message_type: MessageType::SystemStatusUpdate,
            priority: BroadcastPriority::Low,
            timestamp: Utc::now(),
            entry_id: None,
            source_name: None,
            data: Default::default(),
        };
        observer.on_message(&envelope).await;
    }
}
