pub mod broadcast;
pub mod entry;
pub mod error;
pub mod event;
pub mod notification;
pub mod pattern;
pub mod ports;
pub mod result;
pub mod verdict;

pub use broadcast::{BroadcastEnvelope, BroadcastPriority, MessageType};
pub use entry::{LogEntry, LogEntryPriority, LogEntryStatus};
pub use error::{AnalysisError, ModelError, StorageError};
pub use event::{AIAnalysis, EventCategory, ParsedEvent, CRITICAL_SEVERITY_THRESHOLD};
pub use notification::NotificationRule;
pub use pattern::{FormatConfidence, FormatPattern};
pub use ports::{
    Analyzer, ErrorRecord, ErrorSeverity, ErrorSink, NotificationChannel, NotificationContext,
    Observer, PersistenceAdapter, Transaction,
};
pub use result::ProcessingResult;
pub use verdict::ValidationVerdict;
