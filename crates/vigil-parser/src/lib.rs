pub mod categorize;
pub mod format_detector;
pub mod pattern_apply;
pub mod static_parser;
pub mod timestamp;

pub use categorize::categorize;
pub use format_detector::{best_pattern, synthesize_patterns, PatternCache, DELIMITERS};
pub use pattern_apply::apply_pattern;
pub use static_parser::{parse_entries, parse_line};
