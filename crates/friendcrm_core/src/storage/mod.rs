//! Storage contract and persistence backends for friend records.
//!
//! # Responsibility
//! - Define the backend-agnostic `StorageDriver` capability set.
//! - Provide the filesystem backend and an in-memory backend.
//! - Hold the active backend in an explicit `DriverRegistry`.
//!
//! # Invariants
//! - Not-found is a value (`Ok(None)`), never an error.
//! - I/O failures propagate unchanged and are never retried here.
//! - Mutation is full-record overwrite only.

use crate::codec::CodecError;
use crate::model::friend::{Friend, FriendId, InvalidFriendId};
use thiserror::Error;

pub mod driver;
pub mod fs;
pub mod memory;
pub mod registry;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failures surfaced by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
    #[error("failed to decode friend `{id}`: {source}")]
    Decode { id: FriendId, source: CodecError },
    #[error(transparent)]
    InvalidId(#[from] InvalidFriendId),
}

impl StorageError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Filter options for listing friends.
///
/// An absent or empty `name_filter` matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFriendsFilter {
    /// Case-insensitive substring matched against `Friend::name`.
    pub name_filter: Option<String>,
}

impl ListFriendsFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name_filter: Some(name.into()),
        }
    }

    /// Returns whether `friend` passes this filter.
    pub fn matches(&self, friend: &Friend) -> bool {
        match self.name_filter.as_deref() {
            None | Some("") => true,
            Some(needle) => friend
                .name
                .to_lowercase()
                .contains(needle.to_lowercase().as_str()),
        }
    }
}
