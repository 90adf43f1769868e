//! Adaptive format detector: synthesizes candidate `FormatPattern`s from a
//! window of sample lines and ranks them by confidence and frequency.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use vigil_model::{FormatConfidence, FormatPattern};

const SAMPLE_WINDOW: usize = 50;

struct TimestampProbe {
    name: &'static str,
    pattern: &'static str,
}

static TIMESTAMP_PROBES: &[TimestampProbe] = &[
    TimestampProbe { name: "syslog", pattern: r"\b\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}\b" },
    TimestampProbe { name: "iso_datetime", pattern: r"\b\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\b" },
    TimestampProbe { name: "iso_with_ms", pattern: r"\b\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d+\b" },
    TimestampProbe { name: "us_datetime", pattern: r"\b\d{1,2}/\d{1,2}/\d{4}\s+\d{1,2}:\d{2}:\d{2}\b" },
    TimestampProbe { name: "epoch_seconds", pattern: r"\b\d{10}\b" },
    TimestampProbe { name: "epoch_milliseconds", pattern: r"\b\d{13}\b" },
    TimestampProbe { name: "apache_common", pattern: r"\[\d{2}/\w{3}/\d{4}:\d{2}:\d{2}:\d{2}\s+[+-]\d{4}\]" },
];

struct FieldProbe {
    name: &'static str,
    pattern: &'static str,
}

static FIELD_PROBES: &[FieldProbe] = &[
    FieldProbe { name: "hostname", pattern: r"\b([a-zA-Z][a-zA-Z0-9\-]*\.[a-zA-Z]{2,})\b" },
    FieldProbe { name: "ip_address", pattern: r"\b(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\b" },
    FieldProbe { name: "process_name", pattern: r"\b([a-zA-Z_][a-zA-Z0-9_\-]*)\[\d+\]" },
    FieldProbe { name: "pid", pattern: r"\[(\d+)\]" },
    FieldProbe { name: "log_level", pattern: r"\b(DEBUG|INFO|WARN|WARNING|ERROR|FATAL|TRACE)\b" },
    FieldProbe { name: "quoted_string", pattern: r#""([^"]*)""# },
    FieldProbe { name: "bracketed_content", pattern: r"\[([^\]]*)\]" },
    FieldProbe { name: "parenthesized_content", pattern: r"\(([^)]*)\)" },
];

pub const DELIMITERS: &[char] = &[' ', '\t', '|', ',', ';', ':', '='];

fn compiled_timestamp_probes() -> &'static Vec<(&'static str, Regex)> {
    static CELL: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    CELL.get_or_init(|| {
        TIMESTAMP_PROBES
            .iter()
            .map(|p| (p.name, Regex::new(p.pattern).unwrap()))
            .collect()
    })
}

fn compiled_field_probes() -> &'static Vec<(&'static str, Regex)> {
    static CELL: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    CELL.get_or_init(|| {
        FIELD_PROBES
            .iter()
            .map(|p| (p.name, Regex::new(p.pattern).unwrap()))
            .collect()
    })
}

struct TimestampSignal {
    name: &'static str,
    regex: Regex,
    confidence: FormatConfidence,
    match_count: usize,
}

struct FieldSignal {
    name: &'static str,
    consistent: bool,
}

/// Best timestamp probe across the sample: HIGH if matches `>80%` of
/// non-empty lines, MEDIUM if `>50%`, else LOW. `None` if nothing matched.
fn detect_timestamp(lines: &[&str]) -> Option<TimestampSignal> {
    let window: Vec<&&str> = lines.iter().take(SAMPLE_WINDOW).collect();
    let total = window.len().max(1);

    compiled_timestamp_probes()
        .iter()
        .map(|(name, re)| {
            let count = window.iter().filter(|l| re.is_match(l)).count();
            (name, re, count)
        })
        .filter(|(_, _, count)| *count > 0)
        .max_by_key(|(_, _, count)| *count)
        .map(|(name, re, count)| {
            let ratio = count as f64 / total as f64;
            let confidence = if ratio > 0.8 {
                FormatConfidence::High
            } else if ratio > 0.5 {
                FormatConfidence::Medium
            } else {
                FormatConfidence::Low
            };
            TimestampSignal { name, regex: re.clone(), confidence, match_count: count }
        })
}

/// A field is consistent if present in `>=30%` of lines and its start
/// column varies by less than 50 across matches.
fn detect_fields(lines: &[&str]) -> Vec<FieldSignal> {
    let window: Vec<&&str> = lines.iter().take(SAMPLE_WINDOW).collect();
    let total = window.len().max(1);

    compiled_field_probes()
        .iter()
        .map(|(name, re)| {
            let starts: Vec<usize> = window.iter().filter_map(|l| re.find(l).map(|m| m.start())).collect();
            let presence_ratio = starts.len() as f64 / total as f64;
            let variance = starts.iter().max().copied().unwrap_or(0)
                - starts.iter().min().copied().unwrap_or(0);
            FieldSignal { name, consistent: presence_ratio >= 0.3 && variance < 50 }
        })
        .collect()
}

struct DelimiterSignal {
    delimiter: char,
    structured: bool,
}

/// Primary non-space delimiter by total count; "structured" if it appears
/// more than `2 * sample_line_count` times.
fn detect_delimiter(lines: &[&str]) -> Option<DelimiterSignal> {
    let window: Vec<&&str> = lines.iter().take(SAMPLE_WINDOW).collect();
    let line_count = window.len();

    let best = DELIMITERS
        .iter()
        .filter(|d| **d != ' ')
        .map(|d| (*d, window.iter().map(|l| l.matches(*d).count()).sum::<usize>()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)?;

    Some(DelimiterSignal { delimiter: best.0, structured: best.1 > 2 * line_count })
}

/// Build up to one timestamp-based pattern, one delimiter-based pattern,
/// falling back to a single greedy LOW-confidence pattern if neither signal
/// fired.
pub fn synthesize_patterns(sample_lines: &[String]) -> Vec<FormatPattern> {
    let lines: Vec<&str> = sample_lines.iter().map(|s| s.as_str()).collect();
    let mut patterns = Vec::new();

    if let Some(ts) = detect_timestamp(&lines) {
        let fields = detect_fields(&lines);
        let consistent_count = fields.iter().filter(|f| f.consistent).count();
        let confidence = if ts.confidence == FormatConfidence::High && consistent_count >= 2 {
            FormatConfidence::High
        } else if consistent_count >= 1 || ts.confidence == FormatConfidence::Medium {
            FormatConfidence::Medium
        } else {
            FormatConfidence::Low
        };

        let mut regex_src = format!("({})", ts.regex.as_str());
        let mut field_mapping = HashMap::new();
        field_mapping.insert("timestamp".to_string(), 1);
        let mut group_idx = 2;
        if fields.iter().any(|f| f.consistent && f.name == "hostname") {
            regex_src.push_str(r"\s+(\S+)");
            field_mapping.insert("hostname".to_string(), group_idx);
            group_idx += 1;
        }
        if fields.iter().any(|f| f.consistent && f.name == "process_name") {
            regex_src.push_str(r"\s+([^:\[\s]+)");
            field_mapping.insert("process".to_string(), group_idx);
            group_idx += 1;
        }
        regex_src.push_str(r"(?:\[(\d+)\])?");
        field_mapping.insert("pid".to_string(), group_idx);
        group_idx += 1;
        regex_src.push_str(r"\s*:\s*(.+)");
        field_mapping.insert("message".to_string(), group_idx);

        let mut pattern = FormatPattern::new(format!("detected_{}", ts.name), regex_src, confidence)
            .with_field_mapping(field_mapping);
        pattern.sample_lines = sample_lines.iter().take(FormatPattern::MAX_SAMPLE_LINES).cloned().collect();
        pattern.frequency = ts.match_count as u64;
        patterns.push(pattern);
    }

    if let Some(delim) = detect_delimiter(&lines) {
        if delim.structured {
            let sample = lines.first().copied().unwrap_or("");
            let columns = (sample.matches(delim.delimiter).count() + 1).min(6);
            let escaped = regex::escape(&delim.delimiter.to_string());
            let column_group = format!(r"([^{escaped}]+)");
            let regex_src = std::iter::repeat(column_group)
                .take(columns)
                .collect::<Vec<_>>()
                .join(&format!(r"{escaped}\s*"));
            let mut field_mapping = HashMap::new();
            for i in 0..columns {
                field_mapping.insert(format!("field_{i}"), i + 1);
            }
            let mut pattern = FormatPattern::new("detected_delimited", regex_src, FormatConfidence::Medium)
                .with_field_mapping(field_mapping)
                .with_delimiter(delim.delimiter);
            pattern.sample_lines = sample_lines.iter().take(FormatPattern::MAX_SAMPLE_LINES).cloned().collect();
            patterns.push(pattern);
        }
    }

    if patterns.is_empty() {
        let mut pattern = FormatPattern::new("fallback_greedy", r"(.+)", FormatConfidence::Low);
        pattern.field_mapping.insert("message".to_string(), 1);
        pattern.sample_lines = sample_lines.iter().take(FormatPattern::MAX_SAMPLE_LINES).cloned().collect();
        patterns.push(pattern);
    }

    patterns
}

/// Pick the best of a set of candidate patterns: highest confidence rank,
/// then highest frequency.
pub fn best_pattern(patterns: &[FormatPattern]) -> Option<&FormatPattern> {
    patterns.iter().max_by_key(|p| p.eviction_rank())
}

/// Cache of per-source best patterns plus a bounded set of known patterns,
/// evicted by `(confidence rank, frequency)` on overflow. Single-writer
/// (the orchestrator's parse step, under the lock), multi-reader.
pub struct PatternCache {
    max_patterns: usize,
    known: HashMap<(String, u64), FormatPattern>,
    by_source: HashMap<String, (String, u64)>,
}

impl PatternCache {
    pub fn new(max_patterns: usize) -> Self {
        Self { max_patterns, known: HashMap::new(), by_source: HashMap::new() }
    }

    pub fn best_for_source(&self, source: &str) -> Option<&FormatPattern> {
        self.by_source.get(source).and_then(|key| self.known.get(key))
    }

    /// Learn a freshly detected pattern for `source`, merging with any
    /// existing entry sharing its cache key and evicting the weakest entry
    /// if the cache is now over capacity.
    pub fn learn(&mut self, source: &str, pattern: FormatPattern) {
        let key = pattern.cache_key();
        self.known
            .entry(key.clone())
            .and_modify(|existing| existing.merge_detection(&pattern))
            .or_insert(pattern);
        self.by_source.insert(source.to_string(), key);

        if self.known.len() > self.max_patterns {
            if let Some(worst_key) = self
                .known
                .iter()
                .min_by_key(|(_, p)| p.eviction_rank())
                .map(|(k, _)| k.clone())
            {
                self.known.remove(&worst_key);
                self.by_source.retain(|_, v| *v != worst_key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}
