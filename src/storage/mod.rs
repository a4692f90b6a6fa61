//! Durable key-value storage for session artifacts.
//!
//! Backends implement [`KeyValueStorage`] and report their failures.
//! The session core only ever talks to [`SafeStorage`], which absorbs those
//! failures: a failed read is "value absent", a failed write is dropped.

pub mod file;
pub mod memory;

pub use file::{FileStorage, FileStorageConfig};
pub use memory::MemoryStorage;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Storage keys shared by the token store and the session.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const CSRF_TOKEN: &str = "csrf_token";
    pub const USER: &str = "user";
}

/// Failures reported by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<toml::de::Error> for StorageError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for StorageError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// A durable string key-value store.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Infallible view over a [`KeyValueStorage`] backend.
#[derive(Clone)]
pub struct SafeStorage {
    inner: Arc<dyn KeyValueStorage>,
}

impl fmt::Debug for SafeStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeStorage").finish_non_exhaustive()
    }
}

impl SafeStorage {
    pub fn new(inner: Arc<dyn KeyValueStorage>) -> Self {
        Self { inner }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self.inner.get(key) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(key, error = %error, "storage read failed; treating value as absent");
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: &str) {
        if let Err(error) = self.inner.set(key, value) {
            tracing::warn!(key, error = %error, "storage write failed; ignoring");
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(error) = self.inner.remove(key) {
            tracing::warn!(key, error = %error, "storage remove failed; ignoring");
        }
    }

    /// Write `Some(value)` or remove the key for `None`.
    pub fn put(&self, key: &str, value: Option<&str>) {
        match value {
            Some(value) => self.set(key, value),
            None => self.remove(key),
        }
    }
}
