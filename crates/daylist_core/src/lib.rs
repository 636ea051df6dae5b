//! Core logic for daylist, a per-day task and purchase list.
//! This crate owns the entry invariants, the storage adapter and the state store.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::entry::{
    format_date, format_day_label, format_time, parse_date, parse_time, Entry, EntryId,
    EntryKind, EntryValidationError,
};
pub use repo::entry_repo::{EntryRepository, RepoError, RepoResult, SqliteEntryRepository};
pub use service::app_store::{AppStore, DayView, StoreError, StoreResult};
pub use service::clock::{Clock, FixedClock, SystemClock};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
