//! Validator.
//!
//! Check order is load-bearing: size → per-line length/charset →
//! suspicious patterns → source fields. A line that is both too long and
//! suspicious reports REPAIRABLE, not SUSPICIOUS, because the length check
//! returns first.

use vigil_model::{LogEntry, ValidationVerdict};

use crate::patterns::is_suspicious;

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub max_content_length: usize,
    pub max_line_length: usize,
    pub max_source_name_length: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_content_length: 1024 * 1024,
            max_line_length: 32 * 1024,
            max_source_name_length: 255,
        }
    }
}

fn is_allowed_byte(b: u8) -> bool {
    (0x20..=0x7E).contains(&b) || matches!(b, 0x09 | 0x0A | 0x0D)
}

pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn validate(&self, entry: &LogEntry) -> ValidationVerdict {
        if entry.content.trim().is_empty() {
            return ValidationVerdict::Invalid;
        }
        if entry.content.len() > self.config.max_content_length {
            return ValidationVerdict::Invalid;
        }

        let needs_repair = entry.content.lines().any(|line| {
            line.len() > self.config.max_line_length
                || line.bytes().any(|b| !is_allowed_byte(b))
        });
        if needs_repair {
            return ValidationVerdict::Repairable;
        }

        if is_suspicious(&entry.content) {
            tracing::warn!(entry_id = %entry.entry_id, source = %entry.source_name, "suspicious pattern detected");
            return ValidationVerdict::Suspicious;
        }

        if entry.source_name.trim().is_empty()
            || entry.source_name.len() > self.config.max_source_name_length
        {
            tracing::warn!(entry_id = %entry.entry_id, "invalid source name");
            return ValidationVerdict::Invalid;
        }

        ValidationVerdict::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;
    use vigil_model::LogEntryPriority;

    fn entry(content: &str) -> LogEntry {
        LogEntry::new(
            Uuid::new_v4(),
            Utc::now(),
            content,
            None,
            "host1",
            LogEntryPriority::Medium,
            3,
        )
    }

    #[test]
    fn empty_content_is_invalid() {
        let v = Validator::new(ValidatorConfig::default());
        assert_eq!(v.validate(&entry("   ")), ValidationVerdict::Invalid);
    }

    #[test]
    fn oversize_content_is_invalid() {
        let v = Validator::new(ValidatorConfig {
            max_content_length: 10,
            ..Default::default()
        });
        assert_eq!(v.validate(&entry("this is definitely too long")), ValidationVerdict::Invalid);
    }

    #[test]
    fn long_line_is_repairable_even_when_suspicious() {
        let v = Validator::new(ValidatorConfig {
            max_line_length: 10,
            ..Default::default()
        });
        let content = "UNION SELECT * FROM users WHERE 1=1";
        assert!(is_suspicious(content));
        assert_eq!(v.validate(&entry(content)), ValidationVerdict::Repairable);
    }

    #[test]
    fn suspicious_content_within_limits_is_suspicious() {
        let v = Validator::new(ValidatorConfig::default());
        assert_eq!(
            v.validate(&entry("UNION SELECT * FROM users")),
            ValidationVerdict::Suspicious
        );
    }

    #[test]
    fn clean_content_is_valid() {
        let v = Validator::new(ValidatorConfig::default());
        assert_eq!(
            v.validate(&entry("Jan 15 10:30:45 host sshd[1]: session opened")),
            ValidationVerdict::Valid
        );
    }
}
