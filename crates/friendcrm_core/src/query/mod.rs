//! Derived reports over any storage backend.
//!
//! # Responsibility
//! - Compute upcoming birthdays and reconnect suggestions once, generically,
//!   on top of the `StorageDriver` primitives.
//!
//! # Invariants
//! - Reports never bypass `list_friends` and add no error cases of their own.

pub mod derived;
