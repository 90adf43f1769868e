//! Wall-clock and identity minting.
//!
//! A thin seam over `chrono`/`uuid` so the rest of the workspace never calls
//! `Utc::now()` or `Uuid::new_v4()` directly. Tests that need deterministic
//! timestamps or ids can swap in `FixedClock`.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

/// Source of wall-clock time and fresh identifiers.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn new_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Real wall clock, backed by the system clock and random UUIDv4s.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests: starts at an epoch and advances only when
/// told to, minting ids from a counter instead of randomness.
#[derive(Debug)]
pub struct FixedClock {
    millis: AtomicI64,
    counter: AtomicI64,
}

impl FixedClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
            counter: AtomicI64::new(0),
        }
    }

    pub fn advance(&self, duration: chrono::Duration) {
        self.millis
            .fetch_add(duration.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.millis.load(Ordering::SeqCst);
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }

    fn new_id(&self) -> Uuid {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Uuid::from_u128(n as u128)
    }
}

/// Clock-skew tolerance applied when validating event/entry timestamps.
pub const CLOCK_SKEW_TOLERANCE: chrono::Duration = chrono::Duration::hours(1);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances_deterministically() {
        let clock = FixedClock::new(Utc::now());
        let first = clock.now();
        clock.advance(chrono::Duration::seconds(5));
        let second = clock.now();
        assert_eq!((second - first).num_seconds(), 5);
    }

    #[test]
    fn fixed_clock_ids_are_distinct() {
        let clock = FixedClock::new(Utc::now());
        assert_ne!(clock.new_id(), clock.new_id());
    }
}
