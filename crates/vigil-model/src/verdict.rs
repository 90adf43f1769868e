//! Validator verdicts. Lives in the model crate because both
//! the validator and the orchestrator's `ProcessingResult` reference it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationVerdict {
    Valid,
    Repairable,
    Suspicious,
    Invalid,
}
