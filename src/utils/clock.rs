//! Wall clock used to stamp heartbeats and evaluate the presence windows.
use std::sync::atomic::{AtomicI64, Ordering};

use crate::models::Timestamp;

pub trait Clock: Send + Sync {
    /// Current unix time in seconds.
    fn now(&self) -> Timestamp;
}

/// Real time from the system clock. Skew between hosts is not corrected.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp()
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    value: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            value: AtomicI64::new(start),
        }
    }

    pub fn set(&self, value: Timestamp) {
        self.value.store(value, Ordering::SeqCst);
    }

    /// Move forward by `secs` and return the new time.
    pub fn advance(&self, secs: Timestamp) -> Timestamp {
        self.value.fetch_add(secs, Ordering::SeqCst) + secs
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.value.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now(), 100);
        assert_eq!(clock.advance(20), 120);
        clock.set(5);
        assert_eq!(clock.now(), 5);
    }

    #[test]
    fn test_system_clock_is_unix_seconds() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now() > 1_577_836_800);
    }
}
