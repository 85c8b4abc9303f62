//! In-memory storage driver.
//!
//! Keeps records in a sorted map for the process lifetime. Used by tests and
//! by callers that want the derived reports without touching disk.

use super::driver::StorageDriver;
use super::{ListFriendsFilter, StorageResult};
use crate::model::friend::{validate_friend_id, Friend, FriendId};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStorageDriver {
    friends: RwLock<BTreeMap<FriendId, Friend>>,
}

impl MemoryStorageDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a driver pre-populated with `friends`.
    pub fn with_friends(friends: impl IntoIterator<Item = Friend>) -> Self {
        let friends = friends
            .into_iter()
            .map(|friend| (friend.id.clone(), friend))
            .collect();
        Self {
            friends: RwLock::new(friends),
        }
    }
}

#[async_trait]
impl StorageDriver for MemoryStorageDriver {
    fn name(&self) -> &str {
        "memory"
    }

    async fn init(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn add_friend(&self, friend: Friend) -> StorageResult<Friend> {
        friend.validate()?;
        self.friends
            .write()
            .await
            .insert(friend.id.clone(), friend.clone());
        Ok(friend)
    }

    async fn get_friend(&self, id: &str) -> StorageResult<Option<Friend>> {
        validate_friend_id(id)?;
        Ok(self.friends.read().await.get(id).cloned())
    }

    async fn remove_friend(&self, id: &str) -> StorageResult<Option<Friend>> {
        validate_friend_id(id)?;
        Ok(self.friends.write().await.remove(id))
    }

    async fn list_friends(&self, filter: &ListFriendsFilter) -> StorageResult<Vec<Friend>> {
        Ok(self
            .friends
            .read()
            .await
            .values()
            .filter(|friend| filter.matches(friend))
            .cloned()
            .collect())
    }

    async fn update_friend(&self, friend: Friend) -> StorageResult<Option<Friend>> {
        friend.validate()?;
        let mut friends = self.friends.write().await;
        match friends.get_mut(&friend.id) {
            Some(slot) => {
                *slot = friend.clone();
                Ok(Some(friend))
            }
            None => Ok(None),
        }
    }
}
