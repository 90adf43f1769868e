//! Applies a learned or auto-detected `FormatPattern` to a line, turning
//! the detector's output into something the orchestrator's parse step can
//! actually use.

use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;
use vigil_model::{EventCategory, FormatPattern, ParsedEvent};

use crate::categorize::categorize;
use crate::timestamp::parse_any;

/// Try to extract a `ParsedEvent` from `line` using `pattern`'s regex and
/// field mapping. Returns `None` if the regex doesn't match, the message
/// group is missing/empty, or the timestamp (when present) is unparseable
/// or beyond the clock-skew window.
pub fn apply_pattern(
    pattern: &FormatPattern,
    line: &str,
    raw_log_id: Uuid,
    event_id: Uuid,
    reference: DateTime<Utc>,
) -> Option<ParsedEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let regex = Regex::new(&pattern.regex).ok()?;
    let caps = regex.captures(line)?;

    let message_idx = *pattern.field_mapping.get("message")?;
    let message = caps.get(message_idx)?.as_str().trim();
    if message.is_empty() {
        return None;
    }

    let timestamp = match pattern.field_mapping.get("timestamp") {
        Some(&idx) => {
            let raw = caps.get(idx).map(|m| m.as_str()).unwrap_or_default();
            let ts = parse_any(raw, reference).unwrap_or(reference);
            if ts > reference + vigil_common::CLOCK_SKEW_TOLERANCE {
                return None;
            }
            ts
        }
        None => reference,
    };

    let hostname = pattern
        .field_mapping
        .get("hostname")
        .and_then(|&idx| caps.get(idx))
        .map(|m| m.as_str());
    let process = pattern
        .field_mapping
        .get("process")
        .and_then(|&idx| caps.get(idx))
        .map(|m| m.as_str());
    let pid = pattern
        .field_mapping
        .get("pid")
        .and_then(|&idx| caps.get(idx))
        .map(|m| m.as_str());

    let source = match (hostname, process, pid) {
        (Some(h), Some(p), Some(pid)) => format!("{h}:{p}[{pid}]"),
        (Some(h), Some(p), None) => format!("{h}:{p}"),
        (Some(h), None, _) => h.to_string(),
        (None, _, _) => "unknown".to_string(),
    };

    let category = categorize(message, &source);
    ParsedEvent::new(event_id, raw_log_id, timestamp, source, message, category, reference).ok()
}

#[allow(dead_code)]
fn unused_category_hint() -> EventCategory {
    EventCategory::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use vigil_model::FormatConfidence;

    #[test]
    fn applies_detected_timestamp_pattern() {
        let reference = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let pattern = crate::format_detector::synthesize_patterns(&[
            "Jan 15 10:30:45 host1 sshd[100]: session opened".to_string(),
        ]);
        let best = pattern.first().unwrap();
        let event = apply_pattern(
            best,
            "Jan 15 10:30:45 host1 sshd[100]: session opened",
            Uuid::new_v4(),
            Uuid::new_v4(),
            reference,
        )
        .unwrap();
        assert!(event.message.contains("session opened"));
    }

    #[test]
    fn rejects_pattern_with_no_match() {
        let p = FormatPattern::new("x", r"^NEVER_MATCHES$", FormatConfidence::Low);
        assert!(apply_pattern(&p, "some other line", Uuid::new_v4(), Uuid::new_v4(), Utc::now()).is_none());
    }
}
