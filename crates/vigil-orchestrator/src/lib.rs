pub mod error_handler;
pub mod metrics;
pub mod pipeline;

pub use error_handler::ErrorHandler;
pub use metrics::{MetricsSnapshot, PipelineMetrics, ProcessingTimeStats};
pub use pipeline::{Orchestrator, OrchestratorConfig, ProcessingCallback};
