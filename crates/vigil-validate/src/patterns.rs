//! Suspicious-content signatures shared by the validator (to classify) and
//! the sanitizer (to detect-and-annotate without rewriting).

use regex::Regex;
use std::sync::OnceLock;

pub struct SuspiciousCategory {
    pub name: &'static str,
    pub patterns: &'static [&'static str],
}

pub static SUSPICIOUS_CATEGORIES: &[SuspiciousCategory] = &[
    SuspiciousCategory {
        name: "sql_injection",
        patterns: &[
            r"(?i)(union\s+select|drop\s+table|delete\s+from|insert\s+into)",
            r"(?i)(\bor\s+1\s*=\s*1|\band\s+1\s*=\s*1)",
        ],
    },
    SuspiciousCategory {
        name: "xss",
        patterns: &[
            r"(?i)(<script|javascript:|on\w+\s*=)",
            r"(?i)(alert\s*\(|confirm\s*\(|prompt\s*\()",
        ],
    },
    SuspiciousCategory {
        name: "path_traversal",
        patterns: &[r"\.\.[\\/]", r"(?i)(etc[\\/]passwd|windows[\\/]system32)"],
    },
    SuspiciousCategory {
        name: "command_injection",
        patterns: &[
            r"\|\s*\w+|&&\s*\w+|;\s*\w+",
            r"(?i)(curl\s+|wget\s+|nc\s+|netcat\s+)",
        ],
    },
    SuspiciousCategory {
        name: "encoded_payload",
        patterns: &[r"%[0-9a-fA-F]{2}", r"\\x[0-9a-fA-F]{2}"],
    },
];

struct CompiledCategory {
    name: &'static str,
    regexes: Vec<Regex>,
}

fn compiled() -> &'static Vec<CompiledCategory> {
    static CELL: OnceLock<Vec<CompiledCategory>> = OnceLock::new();
    CELL.get_or_init(|| {
        SUSPICIOUS_CATEGORIES
            .iter()
            .map(|cat| CompiledCategory {
                name: cat.name,
                regexes: cat
                    .patterns
                    .iter()
                    .map(|p| Regex::new(p).expect("static suspicious pattern is valid"))
                    .collect(),
            })
            .collect()
    })
}

/// Names of every suspicious category that matches `text`, in declaration
/// order, empty if none match.
pub fn detect_categories(text: &str) -> Vec<&'static str> {
    compiled()
        .iter()
        .filter(|cat| cat.regexes.iter().any(|r| r.is_match(text)))
        .map(|cat| cat.name)
        .collect()
}

pub fn is_suspicious(text: &str) -> bool {
    compiled()
        .iter()
        .any(|cat| cat.regexes.iter().any(|r| r.is_match(text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_sql_injection() {
        assert!(is_suspicious("UNION SELECT * FROM users"));
        assert_eq!(detect_categories("UNION SELECT * FROM users"), vec!["sql_injection"]);
    }

    #[test]
    fn detects_xss() {
        assert!(is_suspicious("<script>alert(1)</script>"));
    }

    #[test]
    fn clean_text_is_not_suspicious() {
        assert!(!is_suspicious("Jan 15 10:30:45 host sshd[1]: session opened"));
    }
}
