//! Weighted keyword categorizer: scores a message against each category's
//! keyword list and picks the highest-scoring category.

use regex::Regex;
use std::sync::OnceLock;
use vigil_model::EventCategory;

struct CategoryKeywords {
    category: EventCategory,
    keywords: &'static [&'static str],
}

// Declaration order matters: it is the tie-break when two categories score
// equally.
static CATEGORY_KEYWORDS: &[CategoryKeywords] = &[
    CategoryKeywords {
        category: EventCategory::Auth,
        keywords: &[
            "login", "logout", "authentication", "password", "sudo", "ssh", "auth",
            "credential", "permission", "access denied", "unauthorized",
        ],
    },
    CategoryKeywords {
        category: EventCategory::Kernel,
        keywords: &["kernel", "driver", "hardware", "cpu", "memory", "disk", "usb", "pci"],
    },
    CategoryKeywords {
        category: EventCategory::System,
        keywords: &["system", "service", "daemon", "process", "startup", "shutdown", "boot", "crash"],
    },
    CategoryKeywords {
        category: EventCategory::Network,
        keywords: &["network", "connection", "tcp", "udp", "dns", "dhcp", "firewall", "port"],
    },
    CategoryKeywords {
        category: EventCategory::Security,
        keywords: &[
            "security", "attack", "malware", "virus", "intrusion", "breach", "vulnerability", "exploit",
        ],
    },
    CategoryKeywords {
        category: EventCategory::Application,
        keywords: &["application", "app", "error", "exception", "crash", "bug", "update"],
    },
];

fn whole_word_regex(keyword: &str) -> Regex {
    let escaped = regex::escape(keyword);
    Regex::new(&format!(r"(?i)\b{escaped}\b")).expect("keyword regex is always valid")
}

fn word_boundary_cache() -> &'static Vec<(&'static str, Regex)> {
    static CELL: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    CELL.get_or_init(|| {
        CATEGORY_KEYWORDS
            .iter()
            .flat_map(|c| c.keywords.iter().copied())
            .map(|kw| (kw, whole_word_regex(kw)))
            .collect()
    })
}

/// Score one category's keyword list against the combined, lowercased
/// `message + " " + source` text. Per keyword: `+1` per substring
/// occurrence, `+2` more if it also matches as a whole word anywhere in the
/// combined text, `+3` more if the keyword is a substring of `source` alone
/// (additive, not double-counted against the occurrence score).
fn score_category(keywords: &[&'static str], combined_lower: &str, source_lower: &str) -> i64 {
    let cache = word_boundary_cache();
    let mut score = 0i64;
    for &keyword in keywords {
        let occurrences = combined_lower.matches(keyword).count() as i64;
        score += occurrences;
        if let Some((_, re)) = cache.iter().find(|(k, _)| *k == keyword) {
            if re.is_match(combined_lower) {
                score += 2;
            }
        }
        if source_lower.contains(keyword) {
            score += 3;
        }
    }
    score
}

/// Categorize one event from its message and source.
pub fn categorize(message: &str, source: &str) -> EventCategory {
    let source_lower = source.to_lowercase();
    if source_lower.contains("kernel") && source_lower.contains("[0]") {
        return EventCategory::Kernel;
    }

    let combined_lower = format!("{} {}", message.to_lowercase(), source_lower);

    let mut best: Option<(EventCategory, i64)> = None;
    for entry in CATEGORY_KEYWORDS {
        let score = score_category(entry.keywords, &combined_lower, &source_lower);
        match &best {
            Some((_, best_score)) if score <= *best_score => {}
            _ => best = Some((entry.category, score)),
        }
    }

    match best {
        Some((category, score)) if score > 0 => category,
        _ => EventCategory::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_hard_rule_overrides_score() {
        assert_eq!(categorize("USB disconnect, address 1", "host:kernel[0]"), EventCategory::Kernel);
    }

    #[test]
    fn auth_keywords_win() {
        assert_eq!(
            categorize("Failed password for admin from 192.168.1.100", "MacBook:sshd[456]"),
            EventCategory::Auth
        );
    }

    #[test]
    fn no_keywords_is_unknown() {
        assert_eq!(categorize("the quick brown fox", "jumps"), EventCategory::Unknown);
    }
}
