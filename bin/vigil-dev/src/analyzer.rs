//! Rule-based `Analyzer`: scores severity from a per-category weighted
//! keyword table rather than calling out to an AI provider, since provider
//! integration is an external collaborator the core never implements —
//! this binary wires the table directly so it can run standalone.

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;
use vigil_model::{AIAnalysis, Analyzer, AnalysisError, EventCategory, ParsedEvent};

struct CategoryRule {
    category: EventCategory,
    keywords: &'static [&'static str],
    base_score: i32,
    multiplier: f64,
}

const RULES: &[CategoryRule] = &[
    CategoryRule {
        category: EventCategory::Security,
        keywords: &["attack", "breach", "malware", "virus", "intrusion", "exploit", "vulnerability"],
        base_score: 8,
        multiplier: 1.2,
    },
    CategoryRule {
        category: EventCategory::Auth,
        keywords: &["failed", "denied", "unauthorized", "invalid", "blocked"],
        base_score: 6,
        multiplier: 1.1,
    },
    CategoryRule {
        category: EventCategory::Network,
        keywords: &["blocked", "denied", "suspicious", "anomaly", "flood"],
        base_score: 5,
        multiplier: 1.0,
    },
    CategoryRule {
        category: EventCategory::System,
        keywords: &["error", "failure", "crash", "panic", "critical"],
        base_score: 4,
        multiplier: 0.9,
    },
    CategoryRule {
        category: EventCategory::Application,
        keywords: &["error", "exception", "crash", "fatal"],
        base_score: 3,
        multiplier: 0.8,
    },
    CategoryRule {
        category: EventCategory::Kernel,
        keywords: &["panic", "oops", "fault", "error"],
        base_score: 7,
        multiplier: 1.1,
    },
    CategoryRule { category: EventCategory::Unknown, keywords: &[], base_score: 2, multiplier: 0.7 },
];

fn rule_for(category: EventCategory) -> &'static CategoryRule {
    RULES
        .iter()
        .find(|r| r.category == category)
        .unwrap_or_else(|| RULES.iter().find(|r| r.category == EventCategory::Unknown).unwrap())
}

/// Scores an event purely from its category and keyword hits, with no
/// external API call — the development-monolith stand-in for whatever
/// AI-backed `Analyzer` a deployment wires in production.
pub struct RuleBasedAnalyzer;

#[async_trait]
impl Analyzer for RuleBasedAnalyzer {
    async fn score(&self, event: &ParsedEvent) -> Result<AIAnalysis, AnalysisError> {
        let rule = rule_for(event.category);
        let message_lower = event.message.to_lowercase();
        let keyword_matches = rule.keywords.iter().filter(|kw| message_lower.contains(*kw)).count();

        let severity = if keyword_matches > 0 {
            let scaled = rule.base_score as f64 * rule.multiplier * (1.0 + keyword_matches as f64 * 0.1);
            (scaled as i32).min(10)
        } else {
            rule.base_score
        };
        let severity = severity.clamp(1, 10);

        let explanation = format!(
            "Rule-based scoring for {} event: base severity {} adjusted by {} keyword match(es) in \"{}\".",
            event.category, rule.base_score, keyword_matches, event.message
        );
        let recommendations = recommendations_for(severity);

        AIAnalysis::new(Uuid::new_v4(), event.id, severity, explanation, recommendations, Utc::now())
            .map_err(|e| AnalysisError(e.to_string()))
    }
}

fn recommendations_for(severity: i32) -> Vec<String> {
    if severity >= vigil_model::CRITICAL_SEVERITY_THRESHOLD {
        vec![
            "Escalate to the on-call security responder immediately".to_string(),
            "Isolate the affected host pending investigation".to_string(),
        ]
    } else if severity >= 5 {
        vec![
            "Review the event within the next shift".to_string(),
            "Correlate with other recent events from the same source".to_string(),
        ]
    } else {
        vec!["No immediate action required; retain for audit trail".to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(category: EventCategory, message: &str) -> ParsedEvent {
        let now = Utc::now();
        ParsedEvent::new(Uuid::new_v4(), Uuid::new_v4(), now, "host1", message, category, now).unwrap()
    }

    #[tokio::test]
    async fn security_keywords_raise_severity_above_base() {
        let analyzer = RuleBasedAnalyzer;
        let result = analyzer
            .score(&event(EventCategory::Security, "detected a malware intrusion attempt"))
            .await
            .unwrap();
        assert!(result.severity_score > 8 || result.severity_score == 10);
    }

    #[tokio::test]
    async fn unknown_category_with_no_keywords_scores_low() {
        let analyzer = RuleBasedAnalyzer;
        let result = analyzer.score(&event(EventCategory::Unknown, "routine heartbeat")).await.unwrap();
        assert_eq!(result.severity_score, 2);
    }

    #[tokio::test]
    async fn severity_never_exceeds_ten() {
        let analyzer = RuleBasedAnalyzer;
        let result = analyzer
            .score(&event(
                EventCategory::Security,
                "attack breach malware virus intrusion exploit vulnerability",
            ))
            .await
            .unwrap();
        assert!(result.severity_score <= 10);
    }
}
