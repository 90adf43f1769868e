//! A `NotificationChannel` that just logs — the dev-monolith stand-in for
//! email/Slack/webhook channels, which are external collaborators the core
//! never implements.

use async_trait::async_trait;
use tracing::info;
use vigil_model::{NotificationChannel, NotificationContext};

pub struct LoggingChannel {
    id: String,
}

impl LoggingChannel {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl NotificationChannel for LoggingChannel {
    fn channel_type(&self) -> &str {
        "log"
    }

    fn channel_id(&self) -> &str {
        &self.id
    }

    async fn validate_config(&self) -> bool {
        true
    }

    async fn send(&self, context: &NotificationContext) -> bool {
        let severity = context.analysis.as_ref().map(|a| a.severity_score);
        info!(
            rule = %context.rule_name,
            source = %context.event.source,
            severity = ?severity,
            message = %context.event.message,
            "notification dispatched"
        );
        true
    }
}
