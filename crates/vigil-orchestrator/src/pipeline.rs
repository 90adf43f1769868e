//! Processing orchestrator: composes queue → validate → sanitize? → parse →
//! persist+analyze → notify → broadcast for one `LogEntry`, never letting a
//! stage failure cross to another entry.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use tracing::info;
use uuid::Uuid;
use vigil_common::{metadata_keys, Clock, Value, VigilError};
use vigil_model::{
    AIAnalysis, Analyzer, LogEntry, LogEntryStatus, ParsedEvent, PersistenceAdapter,
    ProcessingResult, ValidationVerdict,
};
use vigil_parser::PatternCache;
use vigil_queue::{BatchProcessor, EntryOutcome};
use vigil_validate::{Sanitizer, Validator};

use crate::error_handler::ErrorHandler;
use crate::metrics::PipelineMetrics;

const UNPARSED_CONTENT_PREVIEW: usize = 1000;

pub type ProcessingCallback = Arc<dyn Fn(&LogEntry, &ProcessingResult) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub analyzer_timeout: Duration,
    pub max_patterns: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            analyzer_timeout: Duration::from_secs(30),
            max_patterns: 5,
        }
    }
}

/// Owns one pipeline's per-instance state: pattern cache, callbacks, and
/// the collaborators injected at construction rather than reached through
/// globals.
pub struct Orchestrator {
    config: OrchestratorConfig,
    validator: Validator,
    sanitizer: Sanitizer,
    pattern_cache: RwLock<PatternCache>,
    persistence: Arc<dyn PersistenceAdapter>,
    analyzer: Arc<dyn Analyzer>,
    notify_engine: Arc<vigil_notify::NotificationEngine>,
    broadcaster: Arc<vigil_broadcast::Broadcaster>,
    error_handler: Arc<ErrorHandler>,
    metrics: Arc<PipelineMetrics>,
    clock: Arc<dyn Clock>,
    callbacks: RwLock<Vec<ProcessingCallback>>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        validator: Validator,
        sanitizer: Sanitizer,
        persistence: Arc<dyn PersistenceAdapter>,
        analyzer: Arc<dyn Analyzer>,
        notify_engine: Arc<vigil_notify::NotificationEngine>,
        broadcaster: Arc<vigil_broadcast::Broadcaster>,
        error_handler: Arc<ErrorHandler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let max_patterns = config.max_patterns;
        Self {
            config,
            validator,
            sanitizer,
            pattern_cache: RwLock::new(PatternCache::new(max_patterns)),
            persistence,
            analyzer,
            notify_engine,
            broadcaster,
            error_handler,
            metrics: Arc::new(PipelineMetrics::new()),
            clock,
            callbacks: RwLock::new(Vec::new()),
        }
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        self.metrics.clone()
    }

    pub fn register_callback(&self, callback: ProcessingCallback) {
        self.callbacks.write().push(callback);
    }

    /// Adapts `process_entry` into the shape `vigil_queue::IngestionQueue`
    /// expects: one closure processing a whole batch concurrently.
    pub fn batch_processor(self: &Arc<Self>) -> BatchProcessor {
        let this = self.clone();
        Arc::new(move |batch: Vec<LogEntry>| -> BoxFuture<'static, Vec<EntryOutcome>> {
            let this = this.clone();
            Box::pin(async move {
                let mut outcomes = Vec::with_capacity(batch.len());
                for entry in batch {
                    let entry_id = entry.entry_id;
                    let result = this.process_entry(entry).await;
                    outcomes.push(EntryOutcome { entry_id, result });
                }
                outcomes
            })
        })
    }

    /// Run the full pipeline for one entry. `Ok(())` covers every outcome
    /// that is terminal from the queue's perspective (success, partial
    /// success, warning, and non-retryable failures like INVALID); `Err`
    /// is reserved for storage failures the queue should retry.
    pub async fn process_entry(&self, mut entry: LogEntry) -> Result<(), String> {
        let started = std::time::Instant::now();
        let correlation_id = self.clock.new_id();
        let now = self.clock.now();

        // Step 1: mark PROCESSING, broadcast.
        entry.transition(LogEntryStatus::Processing, now);
        self.broadcaster
            .broadcast_processing_status(entry.entry_id, &entry.source_name, entry.status)
            .await;

        // Step 2: validate, possibly sanitize.
        let verdict = self.validator.validate(&entry);
        self.metrics.record_validation(verdict);

        if matches!(verdict, ValidationVerdict::Repairable | ValidationVerdict::Suspicious) {
            let (sanitized, modified) = self.sanitizer.sanitize(&entry, now);
            entry = sanitized;
            if modified {
                self.metrics.record_sanitized();
            }
        }

        // Step 3: INVALID is terminal, no retry.
        if verdict == ValidationVerdict::Invalid {
            let result = ProcessingResult {
                entry_id: entry.entry_id,
                success: false,
                processing_time: started.elapsed(),
                validation_result: verdict,
                sanitized: false,
                errors: vec!["validation failed".to_string()],
                warnings: Vec::new(),
                metadata: entry.metadata.clone(),
            };
            self.error_handler
                .handle(
                    VigilError::Validation { entry_id: entry.entry_id, reason: "invalid payload".into() },
                    correlation_id,
                )
                .await;
            entry.transition(LogEntryStatus::Failed, self.clock.now());
            self.finish(&entry, result, started).await;
            return Ok(());
        }

        // Step 4: parse.
        let (events, parsing_method) = self.parse(&entry, now);
        self.metrics.record_parsed(events.len() as u64);
        let warnings = if parsing_method == metadata_keys::UNPARSED {
            vec!["unparsed".to_string()]
        } else {
            Vec::new()
        };

        // Step 5: persist + analyze in one transaction.
        let mut errors = Vec::new();
        let mut analyses: Vec<(ParsedEvent, Option<AIAnalysis>)> = Vec::new();

        let tx_result = self.persistence.begin().await;
        let mut tx = match tx_result {
            Ok(tx) => tx,
            Err(source) => {
                self.error_handler
                    .handle(
                        VigilError::Storage { entry_id: entry.entry_id, source: Box::new(source) },
                        correlation_id,
                    )
                    .await;
                return Err("storage transaction failed to open".to_string());
            }
        };

        let mut storage_failed = false;
        for event in events {
            if let Err(source) = tx.insert_event(&event).await {
                self.error_handler
                    .handle(
                        VigilError::Storage { entry_id: entry.entry_id, source: Box::new(source) },
                        correlation_id,
                    )
                    .await;
                storage_failed = true;
                break;
            }

            let analysis = match tokio::time::timeout(self.config.analyzer_timeout, self.analyzer.score(&event)).await {
                Ok(Ok(analysis)) => {
                    self.metrics.record_analyzed();
                    if let Err(source) = tx.insert_analysis(&analysis).await {
                        self.error_handler
                            .handle(
                                VigilError::Storage { entry_id: entry.entry_id, source: Box::new(source) },
                                correlation_id,
                            )
                            .await;
                        storage_failed = true;
                        break;
                    }
                    Some(analysis)
                }
                Ok(Err(source)) => {
                    self.error_handler
                        .handle(
                            VigilError::Analysis { event_id: event.id, source: Box::new(source) },
                            correlation_id,
                        )
                        .await;
                    errors.push("analysis failed".to_string());
                    None
                }
                Err(_) => {
                    errors.push("analysis timed out".to_string());
                    None
                }
            };

            analyses.push((event, analysis));
        }

        if storage_failed {
            let _ = tx.rollback().await;
            return Err("storage transaction failed mid-batch".to_string());
        }

        if let Err(source) = tx.commit().await {
            self.error_handler
                .handle(
                    VigilError::Storage { entry_id: entry.entry_id, source: Box::new(source) },
                    correlation_id,
                )
                .await;
            return Err("storage commit failed".to_string());
        }

        // Step 6: notifications, strictly after commit.
        let mut notified_ok = 0usize;
        let mut notified_failed = 0usize;
        for (event, analysis) in &analyses {
            self.metrics.record_notification_triggered();
            let delivered = self.notify_engine.dispatch(event, analysis.as_ref(), correlation_id).await;
            if delivered > 0 {
                notified_ok += delivered;
            } else {
                notified_failed += 1;
            }
        }
        self.metrics.record_notification_outcome(notified_ok, notified_failed);

        let success = true;
        entry.transition(LogEntryStatus::Completed, self.clock.now());
        info!(
            entry_id = %entry.entry_id,
            events = analyses.len(),
            parsing_method,
            "entry processed"
        );
        let result = ProcessingResult {
            entry_id: entry.entry_id,
            success,
            processing_time: started.elapsed(),
            validation_result: verdict,
            sanitized: entry.metadata.contains_key(metadata_keys::SANITIZED),
            errors,
            warnings,
            metadata: entry.metadata.clone(),
        };

        // Step 7 + 8: callbacks, final broadcast.
        self.finish(&entry, result, started).await;
        Ok(())
    }

    async fn finish(&self, entry: &LogEntry, result: ProcessingResult, started: std::time::Instant) {
        self.metrics.record_entry_processed(result.success, started.elapsed());
        for callback in self.callbacks.read().iter() {
            callback(entry, &result);
        }
        self.broadcaster
            .broadcast_processing_result(entry.entry_id, &entry.source_name, &result)
            .await;
    }

    /// Step 4 of the pipeline: try the per-source learned pattern, then
    /// fresh auto-detection, then the static parser, then synthesize a
    /// single UNPARSED event. Returns events plus the literal
    /// `parsing_method` string recorded in metadata.
    fn parse(&self, entry: &LogEntry, reference: chrono::DateTime<Utc>) -> (Vec<ParsedEvent>, &'static str) {
        let lines: Vec<&str> = entry.content.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.is_empty() {
            return (vec![self.synthesize_unparsed(entry, reference)], metadata_keys::UNPARSED);
        }

        // 4a: per-source learned pattern.
        {
            let cache = self.pattern_cache.read();
            if let Some(pattern) = cache.best_for_source(&entry.source_name) {
                let events: Vec<ParsedEvent> = lines
                    .iter()
                    .filter_map(|line| vigil_parser::apply_pattern(pattern, line, entry.entry_id, self.clock.new_id(), reference))
                    .collect();
                if !events.is_empty() {
                    return (events, "learned_pattern");
                }
            }
        }

        // 4b: fresh auto-detection.
        let sample: Vec<String> = lines.iter().take(50).map(|l| l.to_string()).collect();
        let candidates = vigil_parser::synthesize_patterns(&sample);
        if let Some(best) = vigil_parser::best_pattern(&candidates) {
            let events: Vec<ParsedEvent> = lines
                .iter()
                .filter_map(|line| vigil_parser::apply_pattern(best, line, entry.entry_id, self.clock.new_id(), reference))
                .collect();
            if !events.is_empty() {
                self.pattern_cache.write().learn(&entry.source_name, best.clone());
                return (events, "auto_detection");
            }
        }

        // 4c: static parser.
        let clock = self.clock.clone();
        let events = vigil_parser::parse_entries(&entry.content, entry.entry_id, move || clock.new_id(), reference);
        if !events.is_empty() {
            return (events, "fallback_parser");
        }

        // Final fallback: unparsed synthesis. Always succeeds.
        (vec![self.synthesize_unparsed(entry, reference)], metadata_keys::UNPARSED)
    }

    fn synthesize_unparsed(&self, entry: &LogEntry, reference: chrono::DateTime<Utc>) -> ParsedEvent {
        let preview: String = entry.content.chars().take(UNPARSED_CONTENT_PREVIEW).collect();
        let message = if entry.content.chars().count() > UNPARSED_CONTENT_PREVIEW {
            format!("{preview}...")
        } else if preview.trim().is_empty() {
            "(empty entry)".to_string()
        } else {
            preview
        };

        let mut event = ParsedEvent::new(
            self.clock.new_id(),
            entry.entry_id,
            reference,
            entry.source_name.clone(),
            message,
            vigil_model::EventCategory::Unknown,
            reference,
        )
        .expect("synthesized unparsed message is always non-empty and in-window");
        event
            .metadata
            .insert(metadata_keys::PARSING_FAILED.to_string(), Value::Bool(true));
        event.metadata.insert(
            metadata_keys::ORIGINAL_CONTENT_LENGTH.to_string(),
            Value::Int(entry.content.len() as i64),
        );
        event
    }
}

