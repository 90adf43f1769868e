//! Sanitizer. Operations run in a fixed order: replace disallowed bytes
//! (capped per consecutive run), truncate overlong lines, then
//! detect-and-annotate dangerous sequences without rewriting them.

use chrono::{DateTime, Utc};
use vigil_common::{metadata_keys, Value};
use vigil_model::LogEntry;

use crate::patterns::detect_categories;

pub const REPLACEMENT_CHAR: u8 = b'?';
pub const TRUNCATION_MARKER: &str = " [TRUNCATED]";

#[derive(Debug, Clone)]
pub struct SanitizerConfig {
    pub max_line_length: usize,
    pub max_consecutive_replacements: usize,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            max_line_length: 32 * 1024,
            max_consecutive_replacements: 10,
        }
    }
}

fn is_allowed_byte(b: u8) -> bool {
    (0x20..=0x7E).contains(&b) || matches!(b, 0x09 | 0x0A | 0x0D)
}

pub struct Sanitizer {
    config: SanitizerConfig,
}

impl Sanitizer {
    pub fn new(config: SanitizerConfig) -> Self {
        Self { config }
    }

    /// Returns the sanitized entry and whether anything was modified.
    pub fn sanitize(&self, entry: &LogEntry, now: DateTime<Utc>) -> (LogEntry, bool) {
        let original_length = entry.content.len();
        let mut modified = false;

        let replaced = self.sanitize_characters(&entry.content, &mut modified);
        let truncated = self.sanitize_line_lengths(&replaced, &mut modified);
        let detected = detect_categories(&truncated);

        let mut sanitized = entry.clone();
        sanitized.content = truncated;
        if modified {
            sanitized.mark_sanitized(original_length, sanitized.content.len(), now);
            tracing::debug!(
                entry_id = %entry.entry_id,
                original_length,
                sanitized_length = sanitized.content.len(),
                "entry content sanitized"
            );
        }
        if !detected.is_empty() {
            let values = detected.iter().map(|c| Value::Str(c.to_string())).collect();
            sanitized
                .metadata
                .insert(metadata_keys::DETECTED_PATTERNS.to_string(), Value::List(values));
        }

        (sanitized, modified)
    }

    /// Step 1: replace disallowed bytes with `?`, up to
    /// `max_consecutive_replacements` per consecutive disallowed run;
    /// bytes beyond the cap in that run are dropped, not replaced.
    fn sanitize_characters(&self, content: &str, modified: &mut bool) -> String {
        let mut out = Vec::with_capacity(content.len());
        let mut run_len = 0usize;
        for &b in content.as_bytes() {
            if is_allowed_byte(b) {
                run_len = 0;
                out.push(b);
            } else {
                *modified = true;
                if run_len < self.config.max_consecutive_replacements {
                    out.push(REPLACEMENT_CHAR);
                    run_len += 1;
                }
                // else: excess byte in this run is dropped.
            }
        }
        String::from_utf8(out).unwrap_or_default()
    }

    /// Step 2: truncate any line longer than `max_line_length`, appending
    /// the literal marker.
    fn sanitize_line_lengths(&self, content: &str, modified: &mut bool) -> String {
        let mut lines = Vec::new();
        for line in content.split('\n') {
            if line.len() > self.config.max_line_length {
                *modified = true;
                let cut = floor_char_boundary(line, self.config.max_line_length);
                lines.push(format!("{}{}", &line[..cut], TRUNCATION_MARKER));
            } else {
                lines.push(line.to_string());
            }
        }
        lines.join("\n")
    }
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn replaces_disallowed_bytes_up_to_cap() {
        let san = Sanitizer::new(SanitizerConfig {
            max_consecutive_replacements: 2,
            ..Default::default()
        });
        let content = String::from_utf8(vec![b'a', 0x00, 0x01, 0x02, 0x03, b'b']).unwrap();
        let (result, modified) = san.sanitize(&entry(&content), Utc::now());
        assert!(modified);
        assert_eq!(result.content, "a??b");
    }

    #[test]
    fn truncates_long_lines_with_marker() {
        let san = Sanitizer::new(SanitizerConfig {
            max_line_length: 5,
            ..Default::default()
        });
        let (result, modified) = san.sanitize(&entry("abcdefgh"), Utc::now());
        assert!(modified);
        assert_eq!(result.content, "abcde [TRUNCATED]");
    }

    #[test]
    fn is_idempotent() {
        let san = Sanitizer::new(SanitizerConfig {
            max_line_length: 100,
            max_consecutive_replacements: 2,
        });
        let content = String::from_utf8(vec![b'a', 0x00, 0x00, 0x00, b'b', b'c', b'd', b'e', b'f']).unwrap();
        let now = Utc::now();
        let (once, _) = san.sanitize(&entry(&content), now);
        let (twice, _) = san.sanitize(&once, now);
        assert_eq!(once.content, twice.content);
    }

    #[test]
    fn detects_without_rewriting() {
        let san = Sanitizer::new(SanitizerConfig::default());
        let (result, _) = san.sanitize(&entry("UNION SELECT * FROM users"), Utc::now());
        assert_eq!(result.content, "UNION SELECT * FROM users");
        assert!(result.metadata.contains_key(metadata_keys::DETECTED_PATTERNS));
    }
}
