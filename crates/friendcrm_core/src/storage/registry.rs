//! Active storage backend holder.
//!
//! # Responsibility
//! - Hold the single backend a process uses after startup.
//! - Run backend `init` exactly once, at configuration time.
//!
//! # Invariants
//! - `configure` succeeds at most once until `reset` is called.
//! - `driver` fails until a backend has been configured and initialized.
//! - Configuration transitions are serialized; reads never wait on `init`.

use super::driver::StorageDriver;
use super::StorageError;
use log::{error, info};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tokio::sync::Mutex;

/// Registry misuse and lifecycle failures.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("storage driver already configured: `{0}`")]
    AlreadyConfigured(String),
    #[error("storage driver not configured")]
    NotConfigured,
    #[error("storage driver `{name}` failed to initialize: {source}")]
    Init { name: String, source: StorageError },
    #[error("storage driver `{name}` failed to close: {source}")]
    Close { name: String, source: StorageError },
}

/// Explicit context object owning the active storage backend.
///
/// Created at process start and shared (usually behind an `Arc`) with the
/// service and query layers.
#[derive(Default)]
pub struct DriverRegistry {
    active: RwLock<Option<Arc<dyn StorageDriver>>>,
    transition: Mutex<()>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes `driver` and makes it the active backend.
    ///
    /// # Errors
    /// - `AlreadyConfigured` when a backend is already active; the existing
    ///   backend stays in place and `driver.init` is not called.
    /// - `Init` when the backend fails to initialize; the registry stays
    ///   unconfigured.
    pub async fn configure(&self, driver: Arc<dyn StorageDriver>) -> Result<(), RegistryError> {
        let _transition = self.transition.lock().await;
        if let Some(active) = self.read_slot().as_ref() {
            return Err(RegistryError::AlreadyConfigured(active.name().to_string()));
        }

        let name = driver.name().to_string();
        if let Err(source) = driver.init().await {
            error!(
                "event=registry_configure module=storage.registry status=error driver={name} error={source}"
            );
            return Err(RegistryError::Init { name, source });
        }

        *self.write_slot() = Some(driver);
        info!("event=registry_configure module=storage.registry status=ok driver={name}");
        Ok(())
    }

    /// Returns the active backend.
    pub fn driver(&self) -> Result<Arc<dyn StorageDriver>, RegistryError> {
        self.read_slot().clone().ok_or(RegistryError::NotConfigured)
    }

    pub fn is_configured(&self) -> bool {
        self.read_slot().is_some()
    }

    /// Closes and detaches the active backend, returning it.
    ///
    /// Returns `Ok(None)` when nothing was configured. The backend is
    /// detached even when `close` fails.
    pub async fn reset(&self) -> Result<Option<Arc<dyn StorageDriver>>, RegistryError> {
        let _transition = self.transition.lock().await;
        let Some(driver) = self.write_slot().take() else {
            return Ok(None);
        };

        let name = driver.name().to_string();
        driver
            .close()
            .await
            .map_err(|source| RegistryError::Close {
                name: name.clone(),
                source,
            })?;
        info!("event=registry_reset module=storage.registry status=ok driver={name}");
        Ok(Some(driver))
    }

    fn read_slot(&self) -> RwLockReadGuard<'_, Option<Arc<dyn StorageDriver>>> {
        self.active.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_slot(&self) -> RwLockWriteGuard<'_, Option<Arc<dyn StorageDriver>>> {
        self.active.write().unwrap_or_else(PoisonError::into_inner)
    }
}
