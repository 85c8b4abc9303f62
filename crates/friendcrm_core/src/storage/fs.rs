//! Filesystem-backed storage driver.
//!
//! # Responsibility
//! - Persist one tagged-binary file per friend under `{root}/friends/`.
//! - Map missing files to not-found and every other I/O failure to errors.
//!
//! # Invariants
//! - A record file is named `<id>.friend` and holds the full encoded record.
//! - Writes land in a temporary sibling and are renamed into place, so
//!   readers see either the old or the new record, never a torn one.
//! - No locking: concurrent writers race and the last rename wins.
//! - Directories are created on `init` and never pruned.

use super::driver::StorageDriver;
use super::{ListFriendsFilter, StorageError, StorageResult};
use crate::codec::{decode_friend, encode_friend};
use crate::model::friend::{validate_friend_id, Friend};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use uuid::Uuid;

/// File extension of persisted friend records (without the dot).
pub const FRIEND_FILE_EXTENSION: &str = "friend";
const FRIENDS_DIR_NAME: &str = "friends";
const TEMP_FILE_SUFFIX: &str = "tmp";

/// Reference storage backend writing one file per record.
#[derive(Debug, Clone)]
pub struct FsStorageDriver {
    data_dir: PathBuf,
    friends_dir: PathBuf,
}

impl FsStorageDriver {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let friends_dir = data_dir.join(FRIENDS_DIR_NAME);
        Self {
            data_dir,
            friends_dir,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn friends_dir(&self) -> &Path {
        &self.friends_dir
    }

    /// Resolves the record path for `id`, rejecting ids that are not a
    /// single path segment.
    pub fn friend_path(&self, id: &str) -> StorageResult<PathBuf> {
        validate_friend_id(id)?;
        Ok(self
            .friends_dir
            .join(format!("{id}.{FRIEND_FILE_EXTENSION}")))
    }

    async fn write_friend(&self, friend: &Friend) -> StorageResult<()> {
        let path = self.friend_path(&friend.id)?;
        let bytes = encode_friend(friend);
        let temp_path = self
            .friends_dir
            .join(format!(".{}.{TEMP_FILE_SUFFIX}", Uuid::new_v4().simple()));

        if let Err(err) = fs::write(&temp_path, &bytes).await {
            // A partially written temp file may exist after a failed write.
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::io(
                format!("failed to write `{}`", temp_path.display()),
                err,
            ));
        }

        if let Err(err) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::io(
                format!("failed to replace `{}`", path.display()),
                err,
            ));
        }

        debug!(
            "event=friend_write module=storage.fs status=ok id={} bytes={}",
            friend.id,
            bytes.len()
        );
        Ok(())
    }

    /// Deletes temp files left behind by writes that never reached `rename`.
    async fn sweep_temp_files(&self) -> StorageResult<usize> {
        let dir_context = || format!("failed to list `{}`", self.friends_dir.display());
        let mut entries = fs::read_dir(&self.friends_dir)
            .await
            .map_err(|err| StorageError::io(dir_context(), err))?;

        let suffix = format!(".{TEMP_FILE_SUFFIX}");
        let mut swept = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| StorageError::io(dir_context(), err))?
        {
            let is_temp = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with('.') && name.ends_with(suffix.as_str()));
            if !is_temp {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => swept += 1,
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(StorageError::io(
                        format!("failed to delete `{}`", entry.path().display()),
                        err,
                    ));
                }
            }
        }
        Ok(swept)
    }

    async fn record_exists(&self, id: &str) -> StorageResult<bool> {
        let path = self.friend_path(id)?;
        fs::try_exists(&path).await.map_err(|err| {
            StorageError::io(format!("failed to stat `{}`", path.display()), err)
        })
    }
}

#[async_trait]
impl StorageDriver for FsStorageDriver {
    fn name(&self) -> &str {
        "fs"
    }

    async fn init(&self) -> StorageResult<()> {
        let started_at = Instant::now();
        for dir in [&self.data_dir, &self.friends_dir] {
            if let Err(err) = fs::create_dir_all(dir).await {
                error!(
                    "event=storage_init module=storage.fs status=error dir={} error={}",
                    dir.display(),
                    err
                );
                return Err(StorageError::io(
                    format!("failed to create directory `{}`", dir.display()),
                    err,
                ));
            }
        }

        let swept = self.sweep_temp_files().await?;
        info!(
            "event=storage_init module=storage.fs status=ok data_dir={} swept_temp_files={} duration_ms={}",
            self.data_dir.display(),
            swept,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn add_friend(&self, friend: Friend) -> StorageResult<Friend> {
        self.write_friend(&friend).await?;
        Ok(friend)
    }

    async fn get_friend(&self, id: &str) -> StorageResult<Option<Friend>> {
        let path = self.friend_path(id)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(StorageError::io(
                    format!("failed to read `{}`", path.display()),
                    err,
                ));
            }
        };

        decode_friend(&bytes)
            .map(Some)
            .map_err(|source| StorageError::Decode {
                id: id.to_string(),
                source,
            })
    }

    async fn remove_friend(&self, id: &str) -> StorageResult<Option<Friend>> {
        let Some(friend) = self.get_friend(id).await? else {
            return Ok(None);
        };

        let path = self.friend_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {}
            // Removed by someone else between read and delete.
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(StorageError::io(
                    format!("failed to delete `{}`", path.display()),
                    err,
                ));
            }
        }

        info!("event=friend_remove module=storage.fs status=ok id={id}");
        Ok(Some(friend))
    }

    async fn list_friends(&self, filter: &ListFriendsFilter) -> StorageResult<Vec<Friend>> {
        let dir_context = || format!("failed to list `{}`", self.friends_dir.display());
        let mut entries = fs::read_dir(&self.friends_dir)
            .await
            .map_err(|err| StorageError::io(dir_context(), err))?;

        let suffix = format!(".{FRIEND_FILE_EXTENSION}");
        let mut friends = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| StorageError::io(dir_context(), err))?
        {
            let file_name = entry.file_name();
            let Some(id) = file_name
                .to_str()
                .and_then(|name| name.strip_suffix(suffix.as_str()))
            else {
                continue;
            };
            if validate_friend_id(id).is_err() {
                continue;
            }

            let friend = match self.get_friend(id).await {
                Ok(Some(friend)) => friend,
                Ok(None) => continue,
                Err(err @ StorageError::Decode { .. }) => {
                    warn!(
                        "event=friend_list_skip module=storage.fs status=skipped id={id} error={err}"
                    );
                    continue;
                }
                Err(err) => return Err(err),
            };

            if filter.matches(&friend) {
                friends.push(friend);
            }
        }

        Ok(friends)
    }

    async fn update_friend(&self, friend: Friend) -> StorageResult<Option<Friend>> {
        if !self.record_exists(&friend.id).await? {
            return Ok(None);
        }

        self.write_friend(&friend).await?;
        Ok(Some(friend))
    }
}

#[cfg(test)]
mod tests {
    use super::{FsStorageDriver, FRIEND_FILE_EXTENSION};
    use crate::model::friend::Friend;
    use crate::storage::driver::StorageDriver;
    use crate::storage::StorageError;

    #[test]
    fn friend_path_uses_friends_subdirectory_and_extension() {
        let driver = FsStorageDriver::new("/var/lib/friendcrm");
        let path = driver.friend_path("abc").expect("valid id");
        assert_eq!(
            path,
            std::path::Path::new("/var/lib/friendcrm/friends")
                .join(format!("abc.{FRIEND_FILE_EXTENSION}"))
        );
    }

    #[tokio::test]
    async fn rejects_path_traversal_ids_before_io() {
        let dir = tempfile::tempdir().unwrap();
        let driver = FsStorageDriver::new(dir.path());
        driver.init().await.unwrap();

        let err = driver
            .add_friend(Friend::new("../escape", "Mallory"))
            .await
            .expect_err("traversal id must be rejected");
        assert!(matches!(err, StorageError::InvalidId(_)));
        assert!(!dir.path().join("escape.friend").exists());
    }

    #[tokio::test]
    async fn write_leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let driver = FsStorageDriver::new(dir.path());
        driver.init().await.unwrap();

        driver.add_friend(Friend::new("a", "Anna")).await.unwrap();
        driver.add_friend(Friend::new("a", "Anna K")).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(driver.friends_dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.friend".to_string()]);
    }

    #[tokio::test]
    async fn init_sweeps_stale_temp_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let driver = FsStorageDriver::new(dir.path());
        driver.init().await.unwrap();
        driver.add_friend(Friend::new("a", "Anna")).await.unwrap();
        let stale = driver
            .friends_dir()
            .join(".0192f6a81c2b7d3e8f90123456789abc.tmp");
        std::fs::write(&stale, b"partial").unwrap();

        driver.init().await.unwrap();
        assert!(!stale.exists());
        assert!(driver.get_friend("a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn ids_near_the_file_name_limit_can_be_written() {
        let dir = tempfile::tempdir().unwrap();
        let driver = FsStorageDriver::new(dir.path());
        driver.init().await.unwrap();

        // 248 + ".friend" fills a 255-byte file name.
        let id = "x".repeat(248);
        driver.add_friend(Friend::new(id.as_str(), "Long")).await.unwrap();
        assert_eq!(driver.get_friend(&id).await.unwrap().unwrap().name, "Long");
    }
}
