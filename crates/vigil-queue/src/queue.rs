//! Ingestion queue: bounded, priority-aware, with backpressure, batching,
//! retry, and dead-lettering. Entries drain through one shared priority
//! heap so urgency, not arrival group, decides processing order.

use std::collections::{BinaryHeap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{info, warn};
use uuid::Uuid;
use vigil_common::Clock;
use vigil_model::{LogEntry, LogEntryPriority, LogEntryStatus};

use crate::heap::HeapEntry;

pub const DISPLACED_BY_BACKPRESSURE: &str = "DISPLACED_BY_BACKPRESSURE";

#[derive(Debug, Clone, Default)]
pub struct QueueStats {
    pub total: u64,
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
    pub dead: u64,
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub capacity: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub max_retries: u32,
    pub retry_base: Duration,
    pub retry_max: Duration,
    pub dead_letter_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            batch_size: 50,
            flush_interval: Duration::from_millis(250),
            max_retries: 3,
            retry_base: Duration::from_millis(500),
            retry_max: Duration::from_secs(30),
            dead_letter_capacity: 1000,
        }
    }
}

pub struct DeadLetter {
    pub entry: LogEntry,
    pub reason: String,
}

/// Per-entry outcome reported by the batch processor.
pub struct EntryOutcome {
    pub entry_id: Uuid,
    pub result: Result<(), String>,
}

pub type BatchProcessor = Arc<dyn Fn(Vec<LogEntry>) -> BoxFuture<'static, Vec<EntryOutcome>> + Send + Sync>;
pub type ErrorHandler = Arc<dyn Fn(&LogEntry, &str) + Send + Sync>;

struct Inner {
    heap: Mutex<BinaryHeap<HeapEntry>>,
    in_flight: Mutex<std::collections::HashMap<Uuid, LogEntry>>,
    dead_letters: Mutex<VecDeque<DeadLetter>>,
    notify: Notify,
    stopped: AtomicBool,
    total: AtomicU64,
    pending: AtomicU64,
    processing: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    dead: AtomicU64,
    retried: AtomicU64,
    config: QueueConfig,
    clock: Arc<dyn Clock>,
}

/// Bounded, priority-aware ingestion queue. Cheaply `Clone`-able; all
/// clones share the same underlying state.
#[derive(Clone)]
pub struct IngestionQueue {
    inner: Arc<Inner>,
}

impl IngestionQueue {
    pub fn new(config: QueueConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                heap: Mutex::new(BinaryHeap::new()),
                in_flight: Mutex::new(std::collections::HashMap::new()),
                dead_letters: Mutex::new(VecDeque::new()),
                notify: Notify::new(),
                stopped: AtomicBool::new(false),
                total: AtomicU64::new(0),
                pending: AtomicU64::new(0),
                processing: AtomicU64::new(0),
                completed: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                dead: AtomicU64::new(0),
                retried: AtomicU64::new(0),
                config,
                clock,
            }),
        }
    }

    pub fn pressure(&self) -> f64 {
        let pending = self.inner.pending.load(AtomicOrdering::Relaxed) as f64;
        pending / self.inner.config.capacity as f64
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            total: self.inner.total.load(AtomicOrdering::Relaxed),
            pending: self.inner.pending.load(AtomicOrdering::Relaxed),
            processing: self.inner.processing.load(AtomicOrdering::Relaxed),
            completed: self.inner.completed.load(AtomicOrdering::Relaxed),
            failed: self.inner.failed.load(AtomicOrdering::Relaxed),
            dead: self.inner.dead.load(AtomicOrdering::Relaxed),
        }
    }

    pub fn retried_count(&self) -> u64 {
        self.inner.retried.load(AtomicOrdering::Relaxed)
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(AtomicOrdering::Relaxed)
    }

    /// Accepts the entry unless the queue is stopped, or at capacity with a
    /// non-urgent priority. CRITICAL/HIGH entries may displace the lowest
    /// priority pending entry when the queue is full.
    pub fn enqueue(&self, entry: LogEntry) -> bool {
        if self.inner.stopped.load(AtomicOrdering::Relaxed) {
            return false;
        }

        let mut heap = self.inner.heap.lock();
        let at_capacity = heap.len() >= self.inner.config.capacity;

        if at_capacity {
            if !entry.priority.is_urgent() {
                return false;
            }
            if let Some(displaced) = pop_lowest_priority(&mut heap) {
                drop(heap);
                self.dead_letter(displaced.entry, DISPLACED_BY_BACKPRESSURE.to_string());
                heap = self.inner.heap.lock();
            }
        }

        heap.push(HeapEntry { entry });
        drop(heap);

        self.inner.total.fetch_add(1, AtomicOrdering::Relaxed);
        self.inner.pending.fetch_add(1, AtomicOrdering::Relaxed);
        self.inner.notify.notify_one();
        true
    }

    /// Draw up to `batch_size` entries, sorted by priority, blocking until
    /// either the batch fills or `flush_interval` elapses since the oldest
    /// ready entry.
    pub async fn draw(&self) -> Vec<LogEntry> {
        let deadline = tokio::time::Instant::now() + self.inner.config.flush_interval;
        loop {
            {
                let mut heap = self.inner.heap.lock();
                if !heap.is_empty() {
                    let mut batch = Vec::new();
                    while batch.len() < self.inner.config.batch_size {
                        match heap.pop() {
                            Some(h) => batch.push(h.entry),
                            None => break,
                        }
                    }
                    if !batch.is_empty() {
                        self.inner
                            .pending
                            .fetch_sub(batch.len() as u64, AtomicOrdering::Relaxed);
                        self.inner
                            .processing
                            .fetch_add(batch.len() as u64, AtomicOrdering::Relaxed);
                        let mut in_flight = self.inner.in_flight.lock();
                        for e in &batch {
                            in_flight.insert(e.entry_id, e.clone());
                        }
                        return batch;
                    }
                }
            }

            if self.inner.stopped.load(AtomicOrdering::Relaxed) {
                return Vec::new();
            }

            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Vec::new();
            }
            let wait = deadline - now;
            tokio::select! {
                _ = self.inner.notify.notified() => {}
                _ = tokio::time::sleep(wait) => { return Vec::new(); }
            }
        }
    }

    /// Report the outcome of one previously-drawn entry. Success marks it
    /// COMPLETED; failure retries with exponential backoff up to
    /// `max_retries`, then dead-letters it.
    pub fn report_outcome(&self, entry_id: Uuid, result: Result<(), String>) {
        let entry = {
            let mut in_flight = self.inner.in_flight.lock();
            in_flight.remove(&entry_id)
        };
        let Some(mut entry) = entry else {
            warn!(%entry_id, "report_outcome for unknown in-flight entry");
            return;
        };

        self.inner.processing.fetch_sub(1, AtomicOrdering::Relaxed);

        match result {
            Ok(()) => {
                entry.transition(LogEntryStatus::Completed, self.inner.clock.now());
                self.inner.completed.fetch_add(1, AtomicOrdering::Relaxed);
            }
            Err(error) => {
                entry.record_error(error.clone());
                if entry.can_retry() {
                    self.schedule_retry(entry);
                } else {
                    entry.transition(LogEntryStatus::Dead, self.inner.clock.now());
                    self.inner.failed.fetch_add(1, AtomicOrdering::Relaxed);
                    self.dead_letter(entry, error);
                }
            }
        }
    }

    fn schedule_retry(&self, mut entry: LogEntry) {
        entry.retry_count += 1;
        entry.transition(LogEntryStatus::Retrying, self.inner.clock.now());
        self.inner.retried.fetch_add(1, AtomicOrdering::Relaxed);

        let exp = 2u64.saturating_pow(entry.retry_count);
        let delay = (self.inner.config.retry_base * exp as u32).min(self.inner.config.retry_max);

        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            entry.status = LogEntryStatus::Pending;
            this.reinsert(entry);
        });
    }

    fn reinsert(&self, entry: LogEntry) {
        if self.inner.stopped.load(AtomicOrdering::Relaxed) {
            self.dead_letter(entry, "queue stopped during retry".to_string());
            return;
        }
        let mut heap = self.inner.heap.lock();
        heap.push(HeapEntry { entry });
        drop(heap);
        self.inner.pending.fetch_add(1, AtomicOrdering::Relaxed);
        self.inner.notify.notify_one();
    }

    fn dead_letter(&self, entry: LogEntry, reason: String) {
        self.inner.dead.fetch_add(1, AtomicOrdering::Relaxed);
        let mut dl = self.inner.dead_letters.lock();
        if dl.len() >= self.inner.config.dead_letter_capacity {
            dl.pop_front();
        }
        dl.push_back(DeadLetter { entry, reason });
    }

    pub fn dead_letter_count(&self) -> usize {
        self.inner.dead_letters.lock().len()
    }

    /// Idempotent: flips the stop flag and wakes every waiting worker so
    /// in-flight batches can finish draining without admitting new work.
    pub fn stop(&self) {
        self.inner.stopped.store(true, AtomicOrdering::Relaxed);
        self.inner.notify.notify_waiters();
    }

    pub fn start(&self) {
        self.inner.stopped.store(false, AtomicOrdering::Relaxed);
    }
}

fn pop_lowest_priority(heap: &mut BinaryHeap<HeapEntry>) -> Option<HeapEntry> {
    if heap.is_empty() {
        return None;
    }
    let mut items: Vec<HeapEntry> = std::mem::take(heap).into_vec();
    let min_idx = items
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(i, _)| i)?;
    let displaced = items.swap_remove(min_idx);
    *heap = items.into_iter().collect();
    Some(displaced)
}

/// Run `worker_count` worker loops against `queue`, each draining batches
/// and invoking `processor`, until `queue.stop()` is called and the queue
/// drains.
pub async fn run_workers(
    queue: IngestionQueue,
    worker_count: usize,
    processor: BatchProcessor,
    error_handler: Option<ErrorHandler>,
) {
    let mut handles = Vec::new();
    for worker_id in 0..worker_count {
        let queue = queue.clone();
        let processor = processor.clone();
        let error_handler = error_handler.clone();
        handles.push(tokio::spawn(async move {
            loop {
                let batch = queue.draw().await;
                if batch.is_empty() {
                    if queue.is_stopped() && queue.stats().pending == 0 {
                        break;
                    }
                    continue;
                }
                info!(worker_id, batch_len = batch.len(), "processing batch");
                let entries_by_id: std::collections::HashMap<Uuid, LogEntry> =
                    batch.iter().map(|e| (e.entry_id, e.clone())).collect();
                let outcomes = processor(batch).await;
                for outcome in outcomes {
                    if let (Err(error), Some(entry)) =
                        (&outcome.result, entries_by_id.get(&outcome.entry_id))
                    {
                        if let Some(handler) = &error_handler {
                            handler(entry, error);
                        }
                    }
                    queue.report_outcome(outcome.entry_id, outcome.result);
                }
            }
        }));
    }
    for handle in handles {
        let _ = handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use vigil_common::SystemClock;

    fn make_entry(priority: LogEntryPriority) -> LogEntry {
        LogEntry::new(Uuid::new_v4(), Utc::now(), "content", None, "src", priority, 3)
    }

    #[tokio::test]
    async fn enqueue_respects_capacity_for_non_urgent() {
        let queue = IngestionQueue::new(
            QueueConfig { capacity: 1, ..Default::default() },
            Arc::new(SystemClock),
        );
        assert!(queue.enqueue(make_entry(LogEntryPriority::Low)));
        assert!(!queue.enqueue(make_entry(LogEntryPriority::Low)));
    }

    #[tokio::test]
    async fn critical_displaces_lowest_priority_at_capacity() {
        let queue = IngestionQueue::new(
            QueueConfig { capacity: 1, ..Default::default() },
            Arc::new(SystemClock),
        );
        assert!(queue.enqueue(make_entry(LogEntryPriority::Low)));
        assert!(queue.enqueue(make_entry(LogEntryPriority::Critical)));
        assert_eq!(queue.dead_letter_count(), 1);
    }

    #[tokio::test]
    async fn draw_returns_highest_priority_first() {
        let queue = IngestionQueue::new(QueueConfig::default(), Arc::new(SystemClock));
        queue.enqueue(make_entry(LogEntryPriority::Low));
        queue.enqueue(make_entry(LogEntryPriority::Critical));
        queue.enqueue(make_entry(LogEntryPriority::Medium));
        let batch = queue.draw().await;
        assert_eq!(batch[0].priority, LogEntryPriority::Critical);
    }

    #[tokio::test]
    async fn failed_entry_retries_then_dead_letters() {
        let queue = IngestionQueue::new(
            QueueConfig {
                max_retries: 1,
                retry_base: Duration::from_millis(1),
                retry_max: Duration::from_millis(5),
                ..Default::default()
            },
            Arc::new(SystemClock),
        );
        queue.enqueue(make_entry(LogEntryPriority::Medium));
        let batch = queue.draw().await;
        let id = batch[0].entry_id;
        queue.report_outcome(id, Err("boom".to_string()));
        assert_eq!(queue.retried_count(), 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let batch = queue.draw().await;
        assert_eq!(batch.len(), 1);
        queue.report_outcome(batch[0].entry_id, Err("boom again".to_string()));
        assert_eq!(queue.stats().dead, 1);
    }

    #[tokio::test]
    async fn run_workers_processes_enqueued_entries() {
        let queue = IngestionQueue::new(
            QueueConfig { flush_interval: Duration::from_millis(20), ..Default::default() },
            Arc::new(SystemClock),
        );
        for _ in 0..5 {
            queue.enqueue(make_entry(LogEntryPriority::Medium));
        }
        let processed = Arc::new(AtomicUsize::new(0));
        let processed_clone = processed.clone();
        let processor: BatchProcessor = Arc::new(move |batch: Vec<LogEntry>| {
            let processed = processed_clone.clone();
            Box::pin(async move {
                let outcomes = batch
                    .iter()
                    .map(|e| EntryOutcome { entry_id: e.entry_id, result: Ok(()) })
                    .collect();
                processed.fetch_add(batch.len(), AtomicOrdering::Relaxed);
                outcomes
            })
        });

        let queue_clone = queue.clone();
        let handle = tokio::spawn(run_workers(queue_clone, 2, processor, None));
        tokio::time::sleep(Duration::from_millis(100)).await;
        queue.stop();
        let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert_eq!(processed.load(AtomicOrdering::Relaxed), 5);
    }
}
