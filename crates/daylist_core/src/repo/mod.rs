//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage adapter contract used by the state store.
//! - Isolate SQLite query details from state orchestration.
//!
//! # Invariants
//! - Repository writes enforce `Entry::validate()` before persistence.
//! - Deleting a missing id is reported as `false`, not as an error.

pub mod entry_repo;
