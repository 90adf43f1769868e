//! `FormatPattern`: a built-in or learned parsing rule.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormatConfidence {
    Unknown,
    Low,
    Medium,
    High,
}

impl FormatConfidence {
    /// Ordinal rank used for cache eviction: HIGH > MEDIUM > LOW > UNKNOWN.
    /// Deliberately a real numeric ranking rather than comparing the variant
    /// names as strings, which would sort alphabetically
    /// ("HIGH" < "LOW" < "MEDIUM" < "UNKNOWN") and misorder eviction.
    pub fn rank(self) -> u8 {
        match self {
            FormatConfidence::Unknown => 0,
            FormatConfidence::Low => 1,
            FormatConfidence::Medium => 2,
            FormatConfidence::High => 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatPattern {
    pub name: String,
    pub regex: String,
    pub confidence: FormatConfidence,
    pub sample_lines: Vec<String>,
    pub field_mapping: HashMap<String, usize>,
    pub timestamp_format: Option<String>,
    pub delimiter: Option<char>,
    pub frequency: u64,
}

impl FormatPattern {
    pub const MAX_SAMPLE_LINES: usize = 10;

    pub fn new(name: impl Into<String>, regex: impl Into<String>, confidence: FormatConfidence) -> Self {
        Self {
            name: name.into(),
            regex: regex.into(),
            confidence,
            sample_lines: Vec::new(),
            field_mapping: HashMap::new(),
            timestamp_format: None,
            delimiter: None,
            frequency: 0,
        }
    }

    pub fn with_field_mapping(mut self, mapping: HashMap<String, usize>) -> Self {
        self.field_mapping = mapping;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = Some(format.into());
        self
    }

    /// Stable key used to merge repeated detections of the "same" pattern.
    pub fn cache_key(&self) -> (String, u64) {
        (self.name.clone(), stable_hash(&self.regex))
    }

    /// Merge a freshly detected pattern into this cached one: accumulate
    /// frequency, keep the union of sample lines up to the cap.
    pub fn merge_detection(&mut self, fresh: &FormatPattern) {
        self.frequency += 1;
        for line in &fresh.sample_lines {
            if self.sample_lines.len() >= Self::MAX_SAMPLE_LINES {
                self.sample_lines.remove(0);
            }
            self.sample_lines.push(line.clone());
        }
    }

    /// Ranking key for cache eviction: `(confidence rank, frequency)`,
    /// higher wins.
    pub fn eviction_rank(&self) -> (u8, u64) {
        (self.confidence.rank(), self.frequency)
    }
}

fn stable_hash(s: &str) -> u64 {
    // FNV-1a: deterministic across runs, unlike `std::collections::hash_map`'s
    // randomized default hasher, which matters because cache keys are
    // compared across repeated detections within a process.
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in s.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_rank_is_high_to_low() {
        assert!(FormatConfidence::High.rank() > FormatConfidence::Medium.rank());
        assert!(FormatConfidence::Medium.rank() > FormatConfidence::Low.rank());
        assert!(FormatConfidence::Low.rank() > FormatConfidence::Unknown.rank());
    }

    #[test]
    fn cache_key_is_stable() {
        let a = FormatPattern::new("syslog", r"\d+", FormatConfidence::High);
        let b = FormatPattern::new("syslog", r"\d+", FormatConfidence::Low);
        assert_eq!(a.cache_key(), b.cache_key());
    }
}
