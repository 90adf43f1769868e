pub mod heap;
pub mod queue;

pub use queue::{
    run_workers, BatchProcessor, DeadLetter, EntryOutcome, ErrorHandler, IngestionQueue,
    QueueConfig, QueueStats, DISPLACED_BY_BACKPRESSURE,
};
