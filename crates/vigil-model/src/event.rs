//! `ParsedEvent` and `AIAnalysis`: the structured results of parsing and
//! scoring one line of a `LogEntry`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use vigil_common::Metadata;

use crate::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    Auth,
    System,
    Network,
    Security,
    Application,
    Kernel,
    Unknown,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventCategory::Auth => "auth",
            EventCategory::System => "system",
            EventCategory::Network => "network",
            EventCategory::Security => "security",
            EventCategory::Application => "application",
            EventCategory::Kernel => "kernel",
            EventCategory::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedEvent {
    pub id: Uuid,
    pub raw_log_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub message: String,
    pub category: EventCategory,
    pub parsed_at: Option<DateTime<Utc>>,
    pub metadata: Metadata,
}

impl ParsedEvent {
    /// Construct a `ParsedEvent`, enforcing invariants: message
    /// non-empty after trimming, timestamp within the clock-skew window.
    pub fn new(
        id: Uuid,
        raw_log_id: Uuid,
        timestamp: DateTime<Utc>,
        source: impl Into<String>,
        message: impl Into<String>,
        category: EventCategory,
        now: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ModelError::EmptyMessage);
        }
        if timestamp > now + vigil_common::CLOCK_SKEW_TOLERANCE {
            return Err(ModelError::FutureTimestamp);
        }
        Ok(Self {
            id,
            raw_log_id,
            timestamp,
            source: source.into(),
            message,
            category,
            parsed_at: Some(now),
            metadata: Metadata::new(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AIAnalysis {
    pub id: Uuid,
    pub event_id: Uuid,
    pub severity_score: i32,
    pub explanation: String,
    pub recommendations: Vec<String>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

/// Severity at/above which notification throttling is bypassed.
pub const CRITICAL_SEVERITY_THRESHOLD: i32 = 8;

impl AIAnalysis {
    pub fn new(
        id: Uuid,
        event_id: Uuid,
        severity_score: i32,
        explanation: impl Into<String>,
        recommendations: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        if !(1..=10).contains(&severity_score) {
            return Err(ModelError::SeverityOutOfRange(severity_score));
        }
        let explanation = explanation.into();
        if explanation.trim().len() < 10 {
            return Err(ModelError::ExplanationTooShort);
        }
        if recommendations.is_empty() || recommendations.iter().any(|r| r.trim().is_empty()) {
            return Err(ModelError::InvalidRecommendations);
        }
        Ok(Self {
            id,
            event_id,
            severity_score,
            explanation: explanation.trim().to_string(),
            recommendations: recommendations.into_iter().map(|r| r.trim().to_string()).collect(),
            analyzed_at: Some(now),
        })
    }

    pub fn is_critical(&self) -> bool {
        self.severity_score >= CRITICAL_SEVERITY_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_message() {
        let now = Utc::now();
        let err = ParsedEvent::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            now,
            "host",
            "   ",
            EventCategory::Unknown,
            now,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::EmptyMessage));
    }

    #[test]
    fn rejects_future_timestamp() {
        let now = Utc::now();
        let future = now + chrono::Duration::hours(2);
        let err = ParsedEvent::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            future,
            "host",
            "hi",
            EventCategory::Unknown,
            now,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::FutureTimestamp));
    }

    #[test]
    fn analysis_validates_severity_and_explanation() {
        let now = Utc::now();
        assert!(AIAnalysis::new(Uuid::new_v4(), Uuid::new_v4(), 0, "short", vec!["x".into()], now)
            .is_err());
        assert!(AIAnalysis::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            5,
            "too short",
            vec!["x".into()],
            now
        )
        .is_err());
        assert!(AIAnalysis::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            5,
            "a sufficiently long explanation",
            vec![],
            now
        )
        .is_err());
        assert!(AIAnalysis::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            5,
            "a sufficiently long explanation",
            vec!["patch the system".into()],
            now
        )
        .is_ok());
    }
}
