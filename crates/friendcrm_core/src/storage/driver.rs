//! Backend capability contract.

use super::{ListFriendsFilter, StorageResult};
use crate::model::friend::Friend;
use async_trait::async_trait;

/// Capability set every persistence backend implements.
///
/// Derived reports (`birthdays_soon`, `reconnect_soon`) are built on top of
/// `list_friends` in [`crate::query`], so backends only provide primitives.
///
/// Identity is the caller's job: `add_friend` stores the record under the id
/// it already carries.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Short backend name used in logs (`fs`, `memory`).
    fn name(&self) -> &str;

    /// Prepares backend resources. Must be safe to call on an existing store.
    async fn init(&self) -> StorageResult<()>;

    async fn close(&self) -> StorageResult<()>;

    /// Persists `friend` verbatim under `friend.id` and returns it.
    async fn add_friend(&self, friend: Friend) -> StorageResult<Friend>;

    /// Returns `Ok(None)` when no record exists for `id`.
    async fn get_friend(&self, id: &str) -> StorageResult<Option<Friend>>;

    /// Deletes the record and returns what was stored.
    ///
    /// Returns `Ok(None)` when the record was already absent.
    async fn remove_friend(&self, id: &str) -> StorageResult<Option<Friend>>;

    /// Lists records passing `filter`. Order is backend-defined.
    async fn list_friends(&self, filter: &ListFriendsFilter) -> StorageResult<Vec<Friend>>;

    /// Replaces an existing record in full.
    ///
    /// Returns `Ok(None)` and leaves storage untouched when `friend.id` is
    /// unknown.
    async fn update_friend(&self, friend: Friend) -> StorageResult<Option<Friend>>;
}
