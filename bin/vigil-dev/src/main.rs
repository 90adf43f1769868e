//! Vigil development monolith: wires the ingestion queue, orchestrator,
//! notification engine, and broadcaster into one runnable binary for local
//! testing. Reads log lines from a file (or a bundled sample) and runs
//! them through the full pipeline, printing the resulting metrics.

mod analyzer;
mod channels;
mod observer;
mod persistence;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use uuid::Uuid;
use vigil_common::{SystemClock, VigilConfig};
use vigil_model::{ErrorSink, LogEntry, LogEntryPriority, NotificationRule};
use vigil_orchestrator::{ErrorHandler, Orchestrator, OrchestratorConfig};
use vigil_queue::{IngestionQueue, QueueConfig};
use vigil_validate::{Sanitizer, SanitizerConfig, Validator, ValidatorConfig};

const SAMPLE_LOG: &[&str] = &[
    "Jan 15 10:30:45 web01 sshd[1234]: Failed password for admin from 192.168.1.100 port 22 ssh2",
    "Jan 15 10:30:46 web01 sshd[1234]: Accepted password for deploy from 10.0.0.5 port 22 ssh2",
    "2026-07-30T08:12:03Z api-gateway ERROR: unhandled exception in request handler",
    "Jan 15 10:31:02 fw01 kernel: possible intrusion attempt detected from 203.0.113.9, blocked",
    "this line matches no known format and should be synthesized as unparsed",
];

/// Local development harness for the Vigil ingestion pipeline.
#[derive(Parser, Debug)]
#[command(name = "vigil-dev")]
#[command(about = "Run a batch of log lines through the full Vigil pipeline locally")]
struct Args {
    /// Path to a file of newline-delimited log lines. Defaults to a bundled sample.
    #[arg(long, env = "VIGIL_DEV_INPUT")]
    input: Option<PathBuf>,

    /// Source name attached to every ingested entry.
    #[arg(long, env = "VIGIL_DEV_SOURCE", default_value = "dev-harness")]
    source_name: String,

    /// Priority attached to every ingested entry: low, medium, high, critical.
    #[arg(long, env = "VIGIL_DEV_PRIORITY", default_value = "medium")]
    priority: String,
}

fn parse_priority(raw: &str) -> LogEntryPriority {
    match raw.to_lowercase().as_str() {
        "low" => LogEntryPriority::Low,
        "high" => LogEntryPriority::High,
        "critical" => LogEntryPriority::Critical,
        _ => LogEntryPriority::Medium,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    vigil_common::logging::init_logging("vigil-dev");
    let args = Args::parse();
    let config = VigilConfig::from_env();

    let lines: Vec<String> = match &args.input {
        Some(path) => std::fs::read_to_string(path)?.lines().map(|l| l.to_string()).collect(),
        None => {
            info!("no --input given, using bundled sample log lines");
            SAMPLE_LOG.iter().map(|l| l.to_string()).collect()
        }
    };
    info!(count = lines.len(), "loaded log lines");

    let clock: Arc<dyn vigil_common::Clock> = Arc::new(SystemClock);

    let broadcaster = Arc::new(vigil_broadcast::Broadcaster::new(clock.clone()));
    broadcaster.register_observer(Arc::new(observer::StdoutObserver));

    let notify_engine = Arc::new(vigil_notify::NotificationEngine::new(clock.clone()));
    notify_engine.register_channel(Arc::new(channels::LoggingChannel::new("dev-log-channel")));
    notify_engine.add_rule(NotificationRule::new("notify-everything", vec!["dev-log-channel".to_string()]));

    let error_sink: Arc<dyn ErrorSink> = broadcaster.clone();
    let error_handler = Arc::new(ErrorHandler::with_capacity(error_sink, clock.clone(), config.error_ring_capacity));

    let orchestrator_config = OrchestratorConfig {
        analyzer_timeout: Duration::from_millis(config.analyzer_timeout_ms),
        max_patterns: config.max_patterns,
    };
    let orchestrator = Arc::new(Orchestrator::new(
        orchestrator_config,
        Validator::new(ValidatorConfig {
            max_content_length: config.max_content_length,
            max_line_length: config.max_line_length,
            ..ValidatorConfig::default()
        }),
        Sanitizer::new(SanitizerConfig {
            max_line_length: config.max_line_length,
            max_consecutive_replacements: config.max_consecutive_replacements,
        }),
        Arc::new(persistence::InMemoryPersistence::new()),
        Arc::new(analyzer::RuleBasedAnalyzer),
        notify_engine,
        broadcaster,
        error_handler,
        clock.clone(),
    ));

    let queue = IngestionQueue::new(
        QueueConfig {
            capacity: config.max_queue_size,
            batch_size: config.batch_size,
            flush_interval: Duration::from_millis(config.flush_interval_ms),
            max_retries: config.max_retries,
            retry_base: Duration::from_millis(config.retry_base_ms),
            retry_max: Duration::from_millis(config.retry_max_ms),
            dead_letter_capacity: config.dead_letter_capacity,
        },
        clock.clone(),
    );

    let priority = parse_priority(&args.priority);
    for line in &lines {
        let entry = LogEntry::new(
            Uuid::new_v4(),
            clock.now(),
            line.clone(),
            None,
            args.source_name.clone(),
            priority,
            config.max_retries,
        );
        if !queue.enqueue(entry) {
            tracing::warn!("queue rejected an entry at startup (unexpected at this capacity)");
        }
    }
    queue.stop();

    vigil_queue::run_workers(queue.clone(), config.workers, orchestrator.batch_processor(), None).await;

    let snapshot = orchestrator.metrics().snapshot();
    let stats = queue.stats();
    info!(
        entries_processed = snapshot.entries_processed,
        parsed = snapshot.parsed,
        analyzed = snapshot.analyzed,
        failed = snapshot.failed,
        success_rate = snapshot.success_rate,
        queue_completed = stats.completed,
        queue_dead = stats.dead,
        "pipeline run complete"
    );

    Ok(())
}
