//! Wall-clock source for expiry decisions.

use jiff::{SignedDuration, Timestamp};
use parking_lot::Mutex;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

/// The host's system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    /// A clock stopped at `now`.
    #[must_use]
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Jump to `now`, forwards or backwards.
    pub fn set(&self, now: Timestamp) {
        *self.now.lock() = now;
    }

    /// Move the clock forward, saturating at the maximum instant.
    pub fn advance(&self, by: SignedDuration) {
        let mut now = self.now.lock();

        *now = now.checked_add(by).unwrap_or(Timestamp::MAX);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}
