use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("event message is empty after trimming")]
    EmptyMessage,
    #[error("event timestamp is beyond the clock-skew tolerance")]
    FutureTimestamp,
    #[error("severity score {0} is outside [1, 10]")]
    SeverityOutOfRange(i32),
    #[error("explanation must be at least 10 characters")]
    ExplanationTooShort,
    #[error("recommendations must be non-empty and contain no blank entries")]
    InvalidRecommendations,
}

#[derive(Debug, Error)]
#[error("storage error: {0}")]
pub struct StorageError(pub String);

#[derive(Debug, Error)]
#[error("analysis error: {0}")]
pub struct AnalysisError(pub String);
