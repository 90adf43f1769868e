//! Free-form metadata bags attached to entries and events.
//!
//! `Value` gives untyped-dict flexibility inside a typed Rust map without
//! resorting to `serde_json::Value` everywhere the domain types are read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type Metadata = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

/// Well-known metadata key names, kept as documented string constants rather
/// than declared struct fields, since the bag itself stays free-form.
pub mod metadata_keys {
    pub const SANITIZED: &str = "sanitized";
    pub const ORIGINAL_LENGTH: &str = "original_length";
    pub const SANITIZED_LENGTH: &str = "sanitized_length";
    pub const SANITIZED_AT: &str = "sanitized_at";
    pub const DETECTED_PATTERNS: &str = "detected_patterns";
    pub const PARSING_METHOD: &str = "parsing_method";
    pub const REALTIME_PROCESSED: &str = "realtime_processed";
    pub const SOURCE_PATH: &str = "source_path";
    pub const FILE_OFFSET: &str = "file_offset";
    pub const ENTRY_PRIORITY: &str = "entry_priority";
    pub const UNPARSED: &str = "unparsed";
    pub const PARSING_FAILED: &str = "parsing_failed";
    pub const ORIGINAL_CONTENT_LENGTH: &str = "original_content_length";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_round_trip() {
        let v: Value = "hello".into();
        assert_eq!(v.as_str(), Some("hello"));
        let v: Value = 42i64.into();
        assert_eq!(v.as_int(), Some(42));
    }
}
