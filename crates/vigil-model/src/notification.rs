//! `NotificationRule`: matching criteria used by the notification engine.

use serde::{Deserialize, Serialize};

use crate::event::EventCategory;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRule {
    pub rule_name: String,
    pub enabled: bool,
    pub min_severity: i32,
    pub max_severity: i32,
    /// Empty means "any category matches".
    pub categories: Vec<EventCategory>,
    /// Empty means "any source matches".
    pub sources: Vec<String>,
    pub channels: Vec<String>,
    pub throttle_minutes: i64,
    pub email_recipients: Vec<String>,
    pub webhook_url: Option<String>,
    pub slack_channel: Option<String>,
}

impl NotificationRule {
    pub fn new(rule_name: impl Into<String>, channels: Vec<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            enabled: true,
            min_severity: 1,
            max_severity: 10,
            categories: Vec::new(),
            sources: Vec::new(),
            channels,
            throttle_minutes: 0,
            email_recipients: Vec::new(),
            webhook_url: None,
            slack_channel: None,
        }
    }

    /// `severity` defaults to 1 when no analysis is present.
    pub fn matches(&self, category: EventCategory, source: &str, severity: i32) -> bool {
        if !self.enabled {
            return false;
        }
        if severity < self.min_severity || severity > self.max_severity {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.contains(&category) {
            return false;
        }
        if !self.sources.is_empty() && !self.sources.iter().any(|s| s == source) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_lists_match_anything() {
        let rule = NotificationRule::new("r1", vec!["email".into()]);
        assert!(rule.matches(EventCategory::Auth, "anything", 5));
    }

    #[test]
    fn disabled_rule_never_matches() {
        let mut rule = NotificationRule::new("r1", vec!["email".into()]);
        rule.enabled = false;
        assert!(!rule.matches(EventCategory::Auth, "host", 9));
    }

    #[test]
    fn severity_range_is_inclusive() {
        let mut rule = NotificationRule::new("r1", vec!["email".into()]);
        rule.min_severity = 5;
        rule.max_severity = 7;
        assert!(rule.matches(EventCategory::Auth, "host", 5));
        assert!(rule.matches(EventCategory::Auth, "host", 7));
        assert!(!rule.matches(EventCategory::Auth, "host", 4));
        assert!(!rule.matches(EventCategory::Auth, "host", 8));
    }
}
