//! Notification engine: matches a parsed event's analysis against
//! registered rules and dispatches to each matching rule's channels,
//! throttled per `(rule, channel)` except for CRITICAL severities.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::warn;
use uuid::Uuid;
use vigil_common::Clock;
use vigil_model::{
    AIAnalysis, NotificationChannel, NotificationContext, NotificationRule, ParsedEvent,
    CRITICAL_SEVERITY_THRESHOLD,
};

const MAX_SEND_ATTEMPTS: u32 = 2;
const RETRY_BASE_MS: u64 = 500;

#[derive(Debug, Default, Clone)]
pub struct NotifyStats {
    pub rules_evaluated: u64,
    pub rules_matched: u64,
    pub throttled: u64,
    pub sent: u64,
    pub failed: u64,
}

struct StatsInner {
    rules_evaluated: AtomicU64,
    rules_matched: AtomicU64,
    throttled: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
}

impl Default for StatsInner {
    fn default() -> Self {
        Self {
            rules_evaluated: AtomicU64::new(0),
            rules_matched: AtomicU64::new(0),
            throttled: AtomicU64::new(0),
            sent: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }
}

/// Evaluates notification rules against an analyzed event and fans the
/// match out to every channel the rule names, throttling per
/// `(rule_name, source, category)` unless the event is CRITICAL severity.
pub struct NotificationEngine {
    rules: RwLock<Vec<NotificationRule>>,
    channels: RwLock<Vec<Arc<dyn NotificationChannel>>>,
    last_sent: DashMap<String, DateTime<Utc>>,
    stats: StatsInner,
    clock: Arc<dyn Clock>,
}

impl NotificationEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
            channels: RwLock::new(Vec::new()),
            last_sent: DashMap::new(),
            stats: StatsInner::default(),
            clock,
        }
    }

    pub fn add_rule(&self, rule: NotificationRule) {
        self.rules.write().push(rule);
    }

    pub fn register_channel(&self, channel: Arc<dyn NotificationChannel>) {
        self.channels.write().push(channel);
    }

    pub fn stats(&self) -> NotifyStats {
        NotifyStats {
            rules_evaluated: self.stats.rules_evaluated.load(Ordering::Relaxed),
            rules_matched: self.stats.rules_matched.load(Ordering::Relaxed),
            throttled: self.stats.throttled.load(Ordering::Relaxed),
            sent: self.stats.sent.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        }
    }

    fn throttle_key(rule_name: &str, event: &ParsedEvent) -> String {
        format!("{}_{}_{}", rule_name, event.source, event.category)
    }

    fn is_throttled(&self, rule: &NotificationRule, event: &ParsedEvent, severity: i32) -> bool {
        if severity >= CRITICAL_SEVERITY_THRESHOLD {
            return false;
        }
        if rule.throttle_minutes <= 0 {
            return false;
        }
        let key = Self::throttle_key(&rule.rule_name, event);
        let Some(last) = self.last_sent.get(&key) else {
            return false;
        };
        self.clock.now() - *last < ChronoDuration::minutes(rule.throttle_minutes)
    }

    fn mark_sent(&self, rule: &NotificationRule, event: &ParsedEvent) {
        self.last_sent
            .insert(Self::throttle_key(&rule.rule_name, event), self.clock.now());
    }

    /// Evaluate every rule against `event`/`analysis` and dispatch matches
    /// to their configured channels. Returns the number of channel sends
    /// that reported success.
    pub async fn dispatch(&self, event: &ParsedEvent, analysis: Option<&AIAnalysis>, correlation_id: Uuid) -> usize {
        let severity = analysis.map(|a| a.severity_score).unwrap_or(1);
        let rules = self.rules.read().clone();
        let channels = self.channels.read().clone();
        let mut delivered = 0usize;

        for rule in &rules {
            self.stats.rules_evaluated.fetch_add(1, Ordering::Relaxed);
            if !rule.matches(event.category, &event.source, severity) {
                continue;
            }
            self.stats.rules_matched.fetch_add(1, Ordering::Relaxed);

            if self.is_throttled(rule, event, severity) {
                self.stats.throttled.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            let context = NotificationContext {
                event: event.clone(),
                analysis: analysis.cloned(),
                rule_name: rule.rule_name.clone(),
                correlation_id,
            };

            let mut any_success = false;
            for channel_id in &rule.channels {
                let Some(channel) = channels.iter().find(|c| c.channel_id() == channel_id) else {
                    warn!(channel_id, rule = %rule.rule_name, "notification channel not registered");
                    continue;
                };
                if self.send_with_retry(channel.as_ref(), &context).await {
                    any_success = true;
                    delivered += 1;
                    self.stats.sent.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.stats.failed.fetch_add(1, Ordering::Relaxed);
                }
            }

            if any_success {
                self.mark_sent(rule, event);
            }
        }

        delivered
    }

    async fn send_with_retry(&self, channel: &dyn NotificationChannel, context: &NotificationContext) -> bool {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            if channel.send(context).await {
                return true;
            }
            if attempt >= MAX_SEND_ATTEMPTS {
                return false;
            }
            let delay_ms = RETRY_BASE_MS * 2u64.pow(attempt - 1);
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::AtomicUsize;
    use vigil_common::SystemClock;
    use vigil_model::EventCategory;

    struct FlakyChannel {
        id: &'static str,
        fail_times: AtomicUsize,
    }

    #[async_trait]
    impl NotificationChannel for FlakyChannel {
        fn channel_type(&self) -> &str {
            "test"
        }
        fn channel_id(&self) -> &str {
            self.id
        }
        async fn validate_config(&self) -> bool {
            true
        }
        async fn send(&self, _context: &NotificationContext) -> bool {
            let remaining = self.fail_times.load(Ordering::Relaxed);
            if remaining > 0 {
                self.fail_times.fetch_sub(1, Ordering::Relaxed);
                false
            } else {
                true
            }
        }
    }

    fn event() -> ParsedEvent {
        let now = Utc::now();
        ParsedEvent::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            now,
            "host1",
            "auth failure",
            EventCategory::Auth,
            now,
        )
        .unwrap()
    }

    fn analysis(severity: i32) -> AIAnalysis {
        AIAnalysis::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            severity,
            "repeated login failures from one host",
            vec!["lock account".into()],
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn dispatches_to_matching_rule() {
        let engine = NotificationEngine::new(Arc::new(SystemClock));
        engine.add_rule(NotificationRule::new("r1", vec!["chan1".into()]));
        engine.register_channel(Arc::new(FlakyChannel { id: "chan1", fail_times: AtomicUsize::new(0) }));

        let delivered = engine.dispatch(&event(), Some(&analysis(5)), Uuid::new_v4()).await;
        assert_eq!(delivered, 1);
        assert_eq!(engine.stats().sent, 1);
    }

    #[tokio::test]
    async fn retries_once_before_giving_up() {
        let engine = NotificationEngine::new(Arc::new(SystemClock));
        engine.add_rule(NotificationRule::new("r1", vec!["chan1".into()]));
        engine.register_channel(Arc::new(FlakyChannel { id: "chan1", fail_times: AtomicUsize::new(1) }));

        let delivered = engine.dispatch(&event(), Some(&analysis(5)), Uuid::new_v4()).await;
        assert_eq!(delivered, 1);
    }

    #[tokio::test]
    async fn throttles_non_critical_repeats() {
        let engine = NotificationEngine::new(Arc::new(SystemClock));
        let mut rule = NotificationRule::new("r1", vec!["chan1".into()]);
        rule.throttle_minutes = 10;
        engine.add_rule(rule);
        engine.register_channel(Arc::new(FlakyChannel { id: "chan1", fail_times: AtomicUsize::new(0) }));

        let e = event();
        engine.dispatch(&e, Some(&analysis(5)), Uuid::new_v4()).await;
        let second = engine.dispatch(&e, Some(&analysis(5)), Uuid::new_v4()).await;
        assert_eq!(second, 0);
        assert_eq!(engine.stats().throttled, 1);
    }

    #[tokio::test]
    async fn critical_severity_bypasses_throttle() {
        let engine = NotificationEngine::new(Arc::new(SystemClock));
        let mut rule = NotificationRule::new("r1", vec!["chan1".into()]);
        rule.throttle_minutes = 10;
        engine.add_rule(rule);
        engine.register_channel(Arc::new(FlakyChannel { id: "chan1", fail_times: AtomicUsize::new(0) }));

        let e = event();
        engine.dispatch(&e, Some(&analysis(9)), Uuid::new_v4()).await;
        let second = engine.dispatch(&e, Some(&analysis(9)), Uuid::new_v4()).await;
        assert_eq!(second, 1);
    }
}
