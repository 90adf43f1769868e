pub mod broadcaster;

pub use broadcaster::{Broadcaster, BroadcastStats, ResultType};
