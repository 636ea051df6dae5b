//! Wall-clock source for the state store.
//!
//! # Responsibility
//! - Decide what "today" and "now" mean for new entries.
//! - Provide epoch milliseconds for client-generated entry ids.

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Time source injected into `AppStore`.
///
/// Callers needing both date and time read `now()` once so the pair cannot
/// straddle midnight.
pub trait Clock {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;
    /// Milliseconds since the Unix epoch.
    fn epoch_millis(&self) -> i64;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Local system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn epoch_millis(&self) -> i64 {
        Local::now().timestamp_millis()
    }
}

/// Clock frozen at one local instant. Used by tests and previews.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: NaiveDateTime,
}

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self { at }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.at
    }

    fn epoch_millis(&self) -> i64 {
        self.at.and_utc().timestamp_millis()
    }
}
