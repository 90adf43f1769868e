//! Configuration surface: a flat, `Default`-able struct with `VIGIL_*`
//! environment variable overrides — sane default, override via env, rather
//! than a config-file format.

#[derive(Debug, Clone, PartialEq)]
pub struct VigilConfig {
    pub max_queue_size: usize,
    pub batch_size: usize,
    pub workers: usize,
    pub flush_interval_ms: u64,
    pub max_retries: u32,
    pub retry_base_ms: u64,
    pub retry_max_ms: u64,
    pub analyzer_timeout_ms: u64,
    pub channel_send_timeout_ms: u64,
    pub max_content_length: usize,
    pub max_line_length: usize,
    pub max_consecutive_replacements: usize,
    pub max_patterns: usize,
    pub dead_letter_capacity: usize,
    pub error_ring_capacity: usize,
}

impl Default for VigilConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 10_000,
            batch_size: 50,
            workers: 4,
            flush_interval_ms: 250,
            max_retries: 3,
            retry_base_ms: 500,
            retry_max_ms: 30_000,
            analyzer_timeout_ms: 30_000,
            channel_send_timeout_ms: 30_000,
            max_content_length: 1024 * 1024,
            max_line_length: 32 * 1024,
            max_consecutive_replacements: 10,
            max_patterns: 5,
            dead_letter_capacity: 1000,
            error_ring_capacity: 500,
        }
    }
}

impl VigilConfig {
    /// Overlay environment variables on top of the defaults. Unset or
    /// unparsable variables keep the default.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        macro_rules! overlay {
            ($field:ident, $env:expr) => {
                if let Ok(raw) = std::env::var($env) {
                    if let Ok(parsed) = raw.parse() {
                        cfg.$field = parsed;
                    }
                }
            };
        }
        overlay!(max_queue_size, "VIGIL_MAX_QUEUE_SIZE");
        overlay!(batch_size, "VIGIL_BATCH_SIZE");
        overlay!(workers, "VIGIL_WORKERS");
        overlay!(flush_interval_ms, "VIGIL_FLUSH_INTERVAL_MS");
        overlay!(max_retries, "VIGIL_MAX_RETRIES");
        overlay!(retry_base_ms, "VIGIL_RETRY_BASE_MS");
        overlay!(retry_max_ms, "VIGIL_RETRY_MAX_MS");
        overlay!(analyzer_timeout_ms, "VIGIL_ANALYZER_TIMEOUT_MS");
        overlay!(channel_send_timeout_ms, "VIGIL_CHANNEL_SEND_TIMEOUT_MS");
        overlay!(max_content_length, "VIGIL_MAX_CONTENT_LENGTH");
        overlay!(max_line_length, "VIGIL_MAX_LINE_LENGTH");
        overlay!(
            max_consecutive_replacements,
            "VIGIL_MAX_CONSECUTIVE_REPLACEMENTS"
        );
        overlay!(max_patterns, "VIGIL_MAX_PATTERNS");
        overlay!(dead_letter_capacity, "VIGIL_DEAD_LETTER_CAPACITY");
        overlay!(error_ring_capacity, "VIGIL_ERROR_RING_CAPACITY");
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = VigilConfig::default();
        assert_eq!(cfg.max_content_length, 1024 * 1024);
        assert_eq!(cfg.max_line_length, 32 * 1024);
        assert_eq!(cfg.max_consecutive_replacements, 10);
        assert_eq!(cfg.max_patterns, 5);
    }
}
