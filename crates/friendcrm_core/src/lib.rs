//! Core domain logic for FriendCRM.
//! This crate owns the friend record model, its storage contract and the
//! derived birthday/reconnect reports.

pub mod codec;
pub mod config;
pub mod logging;
pub mod model;
pub mod query;
pub mod service;
pub mod storage;

pub use codec::{decode_friend, encode_friend, CodecError};
pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::friend::{validate_friend_id, Friend, FriendId, Interaction, InvalidFriendId};
pub use query::derived::{
    birthdays_soon, birthdays_soon_at, compare_next_birthdays, next_birthday, reconnect_soon,
    reconnect_soon_at, ReconnectSuggestion,
};
pub use service::friend_service::{FriendService, NewFriend, ServiceError, ServiceResult};
pub use storage::driver::StorageDriver;
pub use storage::fs::FsStorageDriver;
pub use storage::memory::MemoryStorageDriver;
pub use storage::registry::{DriverRegistry, RegistryError};
pub use storage::{ListFriendsFilter, StorageError, StorageResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
