//! Crate-wide error kinds.
//!
//! One `thiserror` enum covering the seven error kinds the orchestrator
//! classifies into. Each downstream crate may define its own narrower error
//! type, but `VigilError` is what crosses stage boundaries and what the
//! error handler records and reports through the broadcaster.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum VigilError {
    #[error("validation failed for entry {entry_id}: {reason}")]
    Validation { entry_id: Uuid, reason: String },

    #[error("parsing exhausted all strategies for entry {entry_id}")]
    Parsing { entry_id: Uuid },

    #[error("storage transaction failed for entry {entry_id}: {source}")]
    Storage {
        entry_id: Uuid,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("analyzer failed for event {event_id}: {source}")]
    Analysis {
        event_id: Uuid,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("notification channel {channel_id} failed: {reason}")]
    Notification { channel_id: String, reason: String },

    #[error("broadcast fan-out failed: {reason}")]
    Broadcast { reason: String },

    #[error("internal error processing entry {entry_id}: {reason}")]
    Internal { entry_id: Uuid, reason: String },
}

/// The recovery action the error handler attaches to a classified error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    Retry,
    Drop,
    SynthesizeFallback,
    Escalate,
    None,
}

impl VigilError {
    /// Recovery policy fixed per kind.
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            VigilError::Validation { .. } => RecoveryAction::None,
            VigilError::Parsing { .. } => RecoveryAction::SynthesizeFallback,
            VigilError::Storage { .. } => RecoveryAction::Retry,
            VigilError::Analysis { .. } => RecoveryAction::None,
            VigilError::Notification { .. } => RecoveryAction::Retry,
            VigilError::Broadcast { .. } => RecoveryAction::None,
            VigilError::Internal { .. } => RecoveryAction::Escalate,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            VigilError::Validation { .. } => "VALIDATION",
            VigilError::Parsing { .. } => "PARSING",
            VigilError::Storage { .. } => "STORAGE",
            VigilError::Analysis { .. } => "ANALYSIS",
            VigilError::Notification { .. } => "NOTIFICATION",
            VigilError::Broadcast { .. } => "BROADCAST",
            VigilError::Internal { .. } => "INTERNAL",
        }
    }
}
