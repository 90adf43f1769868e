//! Timestamp parsing shared by the static parser and format detector:
//! syslog (no year, adopts a reference year), ISO-8601, and US-style
//! date/time formats.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

fn month_index(month: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lower = month.to_lowercase();
    MONTHS.iter().position(|m| *m == lower).map(|i| i as u32 + 1)
}

fn syslog_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(?i)(\w{3})\s+(\d{1,2})\s+(\d{2}):(\d{2}):(\d{2})").unwrap())
}

fn iso_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| {
        Regex::new(r"(\d{4})-(\d{2})-(\d{2})[T ](\d{2}):(\d{2}):(\d{2})(\.\d+)?").unwrap()
    })
}

fn us_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| {
        Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})\s+(\d{1,2}):(\d{2}):(\d{2})").unwrap()
    })
}

/// Parse a syslog-style date (no year; adopts `reference.year()`).
/// Returns `None` if the month name or day/time components are invalid,
/// including Feb 29 applied to a non-leap year.
pub fn parse_syslog(text: &str, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let caps = syslog_regex().captures(text)?;
    let month = month_index(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;
    let hour: u32 = caps[3].parse().ok()?;
    let minute: u32 = caps[4].parse().ok()?;
    let second: u32 = caps[5].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(reference.year(), month, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;
    Some(Utc.from_utc_datetime(&NaiveDateTime::new(date, time)))
}

pub fn parse_iso(text: &str) -> Option<DateTime<Utc>> {
    let caps = iso_regex().captures(text)?;
    let y: i32 = caps[1].parse().ok()?;
    let mo: u32 = caps[2].parse().ok()?;
    let d: u32 = caps[3].parse().ok()?;
    let h: u32 = caps[4].parse().ok()?;
    let mi: u32 = caps[5].parse().ok()?;
    let s: u32 = caps[6].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(y, mo, d)?;
    let time = NaiveTime::from_hms_opt(h, mi, s)?;
    Some(Utc.from_utc_datetime(&NaiveDateTime::new(date, time)))
}

pub fn parse_us(text: &str) -> Option<DateTime<Utc>> {
    let caps = us_regex().captures(text)?;
    let mo: u32 = caps[1].parse().ok()?;
    let d: u32 = caps[2].parse().ok()?;
    let y: i32 = caps[3].parse().ok()?;
    let h: u32 = caps[4].parse().ok()?;
    let mi: u32 = caps[5].parse().ok()?;
    let s: u32 = caps[6].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(y, mo, d)?;
    let time = NaiveTime::from_hms_opt(h, mi, s)?;
    Some(Utc.from_utc_datetime(&NaiveDateTime::new(date, time)))
}

/// Try ISO, then US, then syslog, matching `_parse_generic_line`'s probe
/// order (the original tries ISO/US first, syslog last, via `re.search`).
pub fn parse_any(text: &str, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
    parse_iso(text).or_else(|| parse_us(text)).or_else(|| parse_syslog(text, reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_syslog_with_current_year() {
        let reference = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let parsed = parse_syslog("Jan 15 10:30:45 MacBook sshd[456]", reference).unwrap();
        assert_eq!(parsed.year(), 2026);
        assert_eq!(parsed.month(), 1);
        assert_eq!(parsed.day(), 15);
    }

    #[test]
    fn feb_29_on_non_leap_year_fails_gracefully() {
        let reference = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert!(parse_syslog("Feb 29 10:30:45 host proc", reference).is_none());
    }

    #[test]
    fn feb_29_on_leap_year_parses() {
        let reference = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert!(parse_syslog("Feb 29 10:30:45 host proc", reference).is_some());
    }
}
