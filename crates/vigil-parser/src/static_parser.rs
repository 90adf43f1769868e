//! Static multi-format parser: a fixed catalog of known log line shapes
//! tried in declaration order before falling back to a generic line parser.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;
use vigil_model::{EventCategory, ParsedEvent};

use crate::categorize::categorize;
use crate::timestamp::{parse_any, parse_syslog};

fn syslog_a() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| {
        Regex::new(r"(?i)(\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})\s+(\S+)\s+([^:]+?)(?:\[(\d+)\])?\s*:\s*(.+)")
            .unwrap()
    })
}

fn syslog_b() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| {
        Regex::new(r"(?i)(\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})\s+(\S+)\s+(\w+)(?:\[(\d+)\])?\s*:\s*(.+)")
            .unwrap()
    })
}

fn generic_syslog() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(?i)(\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})\s+(\S+)\s+(.+)").unwrap())
}

fn build_source(host: &str, process: Option<&str>, pid: Option<&str>) -> String {
    match (process, pid) {
        (Some(p), Some(pid)) => format!("{host}:{p}[{pid}]"),
        (Some(p), None) => format!("{host}:{p}"),
        (None, _) => host.to_string(),
    }
}

/// Parse one line with the static format catalog, trying formats in
/// declaration order (SyslogA, SyslogB, generic syslog), then falling back
/// to the generic line parser. Returns `None` only when the line is truly
/// unparseable (the caller synthesizes an unparsed event in that case).
pub fn parse_line(
    line: &str,
    raw_log_id: Uuid,
    event_id: Uuid,
    reference: DateTime<Utc>,
) -> Option<ParsedEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(caps) = syslog_a().captures(line) {
        let ts = parse_syslog(&caps[1], reference)?;
        if ts > reference + vigil_common::CLOCK_SKEW_TOLERANCE {
            return parse_generic_line(line, raw_log_id, event_id, reference);
        }
        let source = build_source(&caps[2], Some(caps[3].trim()), caps.get(4).map(|m| m.as_str()));
        let message = caps[5].to_string();
        let category = categorize(&message, &source);
        return ParsedEvent::new(event_id, raw_log_id, ts, source, message, category, reference).ok();
    }

    if let Some(caps) = syslog_b().captures(line) {
        let ts = parse_syslog(&caps[1], reference)?;
        if ts > reference + vigil_common::CLOCK_SKEW_TOLERANCE {
            return parse_generic_line(line, raw_log_id, event_id, reference);
        }
        let source = build_source(&caps[2], Some(&caps[3]), caps.get(4).map(|m| m.as_str()));
        let message = caps[5].to_string();
        let category = categorize(&message, &source);
        return ParsedEvent::new(event_id, raw_log_id, ts, source, message, category, reference).ok();
    }

    if let Some(caps) = generic_syslog().captures(line) {
        let ts = parse_syslog(&caps[1], reference)?;
        if ts > reference + vigil_common::CLOCK_SKEW_TOLERANCE {
            return parse_generic_line(line, raw_log_id, event_id, reference);
        }
        let source = caps[2].to_string();
        let message = caps[3].to_string();
        let category = categorize(&message, &source);
        return ParsedEvent::new(event_id, raw_log_id, ts, source, message, category, reference).ok();
    }

    parse_generic_line(line, raw_log_id, event_id, reference)
}

/// Fallback for lines that match none of the built-in formats: search for a
/// timestamp anywhere in the line, then split into source/message on the
/// first `": "` or first whitespace run, defaulting source to `"unknown"`.
fn parse_generic_line(
    line: &str,
    raw_log_id: Uuid,
    event_id: Uuid,
    reference: DateTime<Utc>,
) -> Option<ParsedEvent> {
    let ts = parse_any(line, reference).unwrap_or(reference);
    if ts > reference + vigil_common::CLOCK_SKEW_TOLERANCE {
        return None;
    }

    let (source, message) = if let Some(idx) = line.find(": ") {
        (line[..idx].trim().to_string(), line[idx + 2..].trim().to_string())
    } else if let Some(idx) = line.find(char::is_whitespace) {
        (line[..idx].trim().to_string(), line[idx..].trim().to_string())
    } else {
        ("unknown".to_string(), line.to_string())
    };
    let source = if source.is_empty() { "unknown".to_string() } else { source };
    let category = categorize(&message, &source);
    ParsedEvent::new(event_id, raw_log_id, ts, source, message, category, reference).ok()
}

pub fn parse_entries(
    content: &str,
    raw_log_id: Uuid,
    mut next_id: impl FnMut() -> Uuid,
    reference: DateTime<Utc>,
) -> Vec<ParsedEvent> {
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| parse_line(line, raw_log_id, next_id(), reference))
        .collect()
}

#[allow(dead_code)]
fn unknown_category() -> EventCategory {
    EventCategory::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_known_syslog_auth_line() {
        let reference = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let event = parse_line(
            "Jan 15 10:30:45 MacBook sshd[456]: Failed password for admin from 192.168.1.100",
            Uuid::new_v4(),
            Uuid::new_v4(),
            reference,
        )
        .unwrap();
        assert_eq!(event.source, "MacBook:sshd[456]");
        assert_eq!(event.category, EventCategory::Auth);
        assert!(event.message.contains("Failed password"));
    }

    #[test]
    fn falls_back_to_generic_for_unparseable_line() {
        let reference = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let event = parse_line("this is not a log line", Uuid::new_v4(), Uuid::new_v4(), reference);
        assert!(event.is_some());
    }
}
