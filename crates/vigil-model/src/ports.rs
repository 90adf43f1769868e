//! External collaborator interfaces.
//!
//! The core depends only on these traits; HTTP submission, edge validation,
//! report rendering, database schema, auth, and AI-provider prompt wording
//! all live on the other side of this boundary and are never implemented
//! inside this workspace.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{AnalysisError, StorageError};
use crate::event::{AIAnalysis, ParsedEvent};

/// A single persistence transaction: either every event+analysis from one
/// entry lands, or none do (one
/// transaction").
#[async_trait]
pub trait Transaction: Send {
    async fn insert_event(&mut self, event: &ParsedEvent) -> Result<(), StorageError>;
    async fn insert_analysis(&mut self, analysis: &AIAnalysis) -> Result<(), StorageError>;
    async fn commit(self: Box<Self>) -> Result<(), StorageError>;
    async fn rollback(self: Box<Self>) -> Result<(), StorageError>;
}

#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StorageError>;
}

#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn score(&self, event: &ParsedEvent) -> Result<AIAnalysis, AnalysisError>;
}

/// Context handed to a channel on dispatch.
#[derive(Debug, Clone)]
pub struct NotificationContext {
    pub event: ParsedEvent,
    pub analysis: Option<AIAnalysis>,
    pub rule_name: String,
    pub correlation_id: Uuid,
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn channel_type(&self) -> &str;
    fn channel_id(&self) -> &str;
    async fn validate_config(&self) -> bool;
    async fn send(&self, context: &NotificationContext) -> bool;
}

#[async_trait]
pub trait Observer: Send + Sync {
    async fn on_message(&self, envelope: &crate::broadcast::BroadcastEnvelope);
}

/// Severity attached to an `ErrorRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// One classified error, as recorded by the error handler and reported
/// through an `ErrorSink`.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub kind: &'static str,
    pub severity: ErrorSeverity,
    pub message: String,
    pub entry_id: Option<Uuid>,
    pub correlation_id: Uuid,
    pub recovery_action: vigil_common::RecoveryAction,
    pub occurred_at: chrono::DateTime<chrono::Utc>,
}

/// Breaks the orchestrator/broadcaster/error-handler cycle:
/// the error handler emits through this trait instead of holding a direct
/// reference to the broadcaster.
#[async_trait]
pub trait ErrorSink: Send + Sync {
    async fn emit_error(&self, record: &ErrorRecord);
}
