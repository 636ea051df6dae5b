//! Domain model for dated task and purchase entries.
//!
//! # Responsibility
//! - Define the canonical entry record consumed by storage and state layers.
//!
//! # Invariants
//! - Every entry is identified by a unique `EntryId`.
//! - Deletion is a hard delete; there is no tombstone or update path.

pub mod entry;
