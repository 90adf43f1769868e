//! `ProcessingResult`: the outcome of running one `LogEntry` through the
//! orchestrator's pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;
use vigil_common::Metadata;

use crate::verdict::ValidationVerdict;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub entry_id: Uuid,
    pub success: bool,
    pub processing_time: Duration,
    pub validation_result: ValidationVerdict,
    pub sanitized: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub metadata: Metadata,
}

impl ProcessingResult {
    /// A partial-success has `success = true` and a non-empty `errors` set
    /// (e.g. the analyzer failed but events still persisted).
    pub fn is_partial_success(&self) -> bool {
        self.success && !self.errors.is_empty()
    }
}
