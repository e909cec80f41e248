//! Clock abstraction for the ledger
//!
//! The auction price is a function of elapsed wall-clock time, so the clock
//! is injected rather than read inline. Production uses [`SystemClock`];
//! tests drive [`ManualClock`] to put a job at an exact auction offset.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for deterministic tests
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Advance the clock by whole seconds
    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.write().unwrap_or_else(PoisonError::into_inner);
        *now += Duration::seconds(secs);
    }

    /// Jump the clock to an absolute instant
    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(PoisonError::into_inner) = at;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        // A DateTime is always valid state, so a poisoned lock is recoverable
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_manual_clock_recovers_from_poisoned_lock() {
        let start = Utc::now();
        let clock = Arc::new(ManualClock::starting_at(start));

        let poisoner = clock.clone();
        std::thread::spawn(move || {
            let _guard = poisoner.now.write().unwrap_or_else(PoisonError::into_inner);
            panic!("poison the clock lock");
        })
        .join()
        .unwrap_err();

        // The clock keeps working: the stored instant is always valid state
        assert_eq!(clock.now(), start);
        clock.advance_secs(5);
        assert_eq!(clock.now(), start + Duration::seconds(5));
    }

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc::now();
        let clock = ManualClock::starting_at(start);

        assert_eq!(clock.now(), start);
        clock.advance_secs(30);
        assert_eq!(clock.now(), start + Duration::seconds(30));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
