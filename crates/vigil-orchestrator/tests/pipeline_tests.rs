//! Orchestrator pipeline integration tests
//!
//! Drives `Orchestrator::process_entry` end to end against in-memory fakes
//! for every injected port (persistence, analyzer, error sink), covering:
//! - A known syslog line reaching COMPLETED
//! - INVALID content staying terminal, never retried
//! - Unparseable content synthesizing an UNPARSED event instead of failing
//! - Registered callbacks firing exactly once per entry

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use vigil_broadcast::Broadcaster;
use vigil_common::{Clock, SystemClock};
use vigil_model::{
    AIAnalysis, AnalysisError, Analyzer, ErrorRecord, ErrorSink, LogEntry, LogEntryPriority,
    ParsedEvent, PersistenceAdapter, StorageError, Transaction,
};
use vigil_notify::NotificationEngine;
use vigil_orchestrator::{ErrorHandler, Orchestrator, OrchestratorConfig};
use vigil_validate::{Sanitizer, SanitizerConfig, Validator, ValidatorConfig};

struct NoopTransaction;

#[async_trait]
impl Transaction for NoopTransaction {
    async fn insert_event(&mut self, _event: &ParsedEvent) -> Result<(), StorageError> {
        Ok(())
    }
    async fn insert_analysis(&mut self, _analysis: &AIAnalysis) -> Result<(), StorageError> {
        Ok(())
    }
    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        Ok(())
    }
    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        Ok(())
    }
}

struct InMemoryPersistence;

#[async_trait]
impl PersistenceAdapter for InMemoryPersistence {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StorageError> {
        Ok(Box::new(NoopTransaction))
    }
}

struct RuleAnalyzer;

#[async_trait]
impl Analyzer for RuleAnalyzer {
    async fn score(&self, event: &ParsedEvent) -> Result<AIAnalysis, AnalysisError> {
        AIAnalysis::new(
            Uuid::new_v4(),
            event.id,
            5,
            "rule-based baseline severity score for this event",
            vec!["review the event".to_string()],
            Utc::now(),
        )
        .map_err(|e| AnalysisError(e.to_string()))
    }
}

struct NullSink;

#[async_trait]
impl ErrorSink for NullSink {
    async fn emit_error(&self, _record: &ErrorRecord) {}
}

fn make_orchestrator() -> Orchestrator {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    Orchestrator::new(
        OrchestratorConfig::default(),
        Validator::new(ValidatorConfig::default()),
        Sanitizer::new(SanitizerConfig::default()),
        Arc::new(InMemoryPersistence),
        Arc::new(RuleAnalyzer),
        Arc::new(NotificationEngine::new(clock.clone())),
        Arc::new(Broadcaster::new(clock.clone())),
        Arc::new(ErrorHandler::new(Arc::new(NullSink), clock.clone())),
        clock,
    )
}

fn entry(content: &str) -> LogEntry {
    LogEntry::new(
        Uuid::new_v4(),
        Utc::now(),
        content,
        None,
        "host1",
        LogEntryPriority::Medium,
        3,
    )
}

#[tokio::test]
async fn known_syslog_line_succeeds() {
    let orch = make_orchestrator();
    let result = orch
        .process_entry(entry(
            "Jan 15 10:30:45 MacBook sshd[456]: Failed password for admin from 192.168.1.100",
        ))
        .await;
    assert!(result.is_ok());
    assert_eq!(orch.metrics().snapshot().entries_processed, 1);
    assert_eq!(orch.metrics().snapshot().failed, 0);
}

#[tokio::test]
async fn invalid_content_is_terminal_without_retry() {
    let orch = make_orchestrator();
    let result = orch.process_entry(entry("   ")).await;
    assert!(result.is_ok());
    assert_eq!(orch.metrics().snapshot().invalid, 1);
}

#[tokio::test]
async fn unparseable_content_synthesizes_unparsed_event() {
    let orch = make_orchestrator();
    let result = orch.process_entry(entry("this is not a log line")).await;
    assert!(result.is_ok());
    assert_eq!(orch.metrics().snapshot().parsed, 1);
}

#[tokio::test]
async fn callbacks_fire_once_per_entry() {
    let orch = make_orchestrator();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    orch.register_callback(Arc::new(move |_entry, _result| {
        calls_clone.fetch_add(1, Ordering::Relaxed);
    }));
    orch.process_entry(entry("hello world")).await.unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), 1);
}
