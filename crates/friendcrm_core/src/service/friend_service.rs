//! Friend use-case service.
//!
//! # Responsibility
//! - Provide the entry points request handlers and the CLI call.
//! - Assign identity to new records before they reach storage.
//! - Express small edits (facts, interactions, birthday) as full-record
//!   overwrites through `update_friend`.
//!
//! # Invariants
//! - Service APIs never bypass the storage contract.
//! - No partial-update primitive: every edit rewrites the whole record.

use crate::model::friend::{Friend, FriendId, Interaction};
use crate::query::derived::{
    birthdays_soon, reconnect_soon, ReconnectSuggestion, DEFAULT_BIRTHDAY_DAYS_AHEAD,
    DEFAULT_RECONNECT_MIN_DAYS,
};
use crate::storage::driver::StorageDriver;
use crate::storage::registry::{DriverRegistry, RegistryError};
use crate::storage::{ListFriendsFilter, StorageError};
use chrono::NaiveDate;
use log::info;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("friend not found: {0}")]
    NotFound(FriendId),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Request model for creating a friend. The id is assigned by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewFriend {
    pub name: String,
    pub birthday: Option<NaiveDate>,
    pub facts: Vec<String>,
    pub interactions: Vec<Interaction>,
    pub knows_because: String,
}

impl NewFriend {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Use-case wrapper over the active storage backend.
pub struct FriendService {
    driver: Arc<dyn StorageDriver>,
}

impl FriendService {
    pub fn new(driver: Arc<dyn StorageDriver>) -> Self {
        Self { driver }
    }

    /// Builds a service on the registry's active backend.
    pub fn from_registry(registry: &DriverRegistry) -> ServiceResult<Self> {
        Ok(Self::new(registry.driver()?))
    }

    /// Persists a new friend under a freshly generated UUIDv7 id.
    pub async fn add_friend(&self, request: NewFriend) -> ServiceResult<Friend> {
        let friend = Friend {
            id: Uuid::now_v7().to_string(),
            name: request.name,
            birthday: request.birthday,
            facts: request.facts,
            interactions: request.interactions,
            knows_because: request.knows_because,
        };
        let stored = self.driver.add_friend(friend).await?;
        info!(
            "event=friend_add module=service status=ok driver={} id={}",
            self.driver.name(),
            stored.id
        );
        Ok(stored)
    }

    pub async fn get_friend(&self, id: &str) -> ServiceResult<Option<Friend>> {
        Ok(self.driver.get_friend(id).await?)
    }

    /// Replaces a stored friend in full.
    ///
    /// Returns `NotFound` when the id is unknown; storage is left unchanged.
    pub async fn update_friend(&self, friend: Friend) -> ServiceResult<Friend> {
        let id = friend.id.clone();
        self.driver
            .update_friend(friend)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    /// Removes a friend, returning the deleted record if it existed.
    pub async fn remove_friend(&self, id: &str) -> ServiceResult<Option<Friend>> {
        let removed = self.driver.remove_friend(id).await?;
        if removed.is_some() {
            info!("event=friend_remove module=service status=ok id={id}");
        }
        Ok(removed)
    }

    pub async fn list_friends(&self, name_filter: Option<&str>) -> ServiceResult<Vec<Friend>> {
        let filter = ListFriendsFilter {
            name_filter: name_filter.map(str::to_string),
        };
        Ok(self.driver.list_friends(&filter).await?)
    }

    /// Upcoming birthdays; `None` looks 7 days ahead.
    pub async fn birthdays_soon(&self, days_ahead: Option<u32>) -> ServiceResult<Vec<Friend>> {
        let days_ahead = days_ahead.unwrap_or(DEFAULT_BIRTHDAY_DAYS_AHEAD);
        Ok(birthdays_soon(self.driver.as_ref(), days_ahead).await?)
    }

    /// Reconnect suggestions; `None` uses a 30 day threshold.
    pub async fn reconnect_soon(
        &self,
        min_days: Option<u32>,
    ) -> ServiceResult<Vec<ReconnectSuggestion>> {
        let min_days = min_days.unwrap_or(DEFAULT_RECONNECT_MIN_DAYS);
        Ok(reconnect_soon(self.driver.as_ref(), min_days).await?)
    }

    pub async fn add_fact(&self, id: &str, fact: impl Into<String>) -> ServiceResult<Friend> {
        let fact = fact.into();
        self.modify(id, move |friend| friend.facts.push(fact)).await
    }

    pub async fn log_interaction(
        &self,
        id: &str,
        interaction: Interaction,
    ) -> ServiceResult<Friend> {
        self.modify(id, move |friend| friend.interactions.push(interaction))
            .await
    }

    /// Sets or clears the birthday.
    pub async fn set_birthday(
        &self,
        id: &str,
        birthday: Option<NaiveDate>,
    ) -> ServiceResult<Friend> {
        self.modify(id, move |friend| friend.birthday = birthday).await
    }

    async fn modify<F>(&self, id: &str, apply: F) -> ServiceResult<Friend>
    where
        F: FnOnce(&mut Friend) + Send,
    {
        let mut friend = self
            .driver
            .get_friend(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        apply(&mut friend);
        self.update_friend(friend).await
    }
}
