//! Domain model for the entry screen.
//!
//! # Invariants
//! - Every entry is identified by a store-assigned `EntryId`.
//! - Deletion is a hard delete; the model carries no tombstones.

pub mod entry;
