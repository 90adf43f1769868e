pub mod engine;

pub use engine::{NotificationEngine, NotifyStats};
