//! Domain model for friend records.
//!
//! # Responsibility
//! - Define canonical data structures used by storage and query logic.
//!
//! # Invariants
//! - Every record is identified by a caller-assigned `FriendId`.
//! - Deletion removes the record entirely; there are no tombstones.

pub mod friend;
