//! Namespaced key-value cache over a pluggable storage backend.
//!
//! Per-channel delivery state (`logStreamName`, `sequenceToken`) lives here under
//! `<namespace>:<channel>:<key>`.

pub mod memory;
#[cfg(feature = "sled-storage")]
pub mod sled_store;
pub mod storage;

pub use memory::MemoryStorage;
#[cfg(feature = "sled-storage")]
pub use sled_store::SledStorage;
pub use storage::{Storage, StorageError};

use futures::future::{BoxFuture, join_all};
use std::fmt;
use std::sync::Arc;

pub const NAMESPACE_SEPARATOR: char = ':';

#[derive(Clone)]
pub struct Cache {
    storage: Arc<dyn Storage>,
    namespace: String,
}

impl Cache {
    pub fn new(storage: Arc<dyn Storage>, namespace: impl Into<String>) -> Self {
        Self {
            storage,
            namespace: namespace.into(),
        }
    }

    /// A cache whose keys live under this cache's namespace.
    pub fn scoped(&self, namespace: impl AsRef<str>) -> Cache {
        Cache::new(Arc::new(self.clone()), namespace.as_ref())
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn key(&self, key: &str) -> String {
        format!("{}{NAMESPACE_SEPARATOR}{key}", self.namespace)
    }

    pub async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage.get_item(&self.key(key)).await
    }

    pub async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage.set_item(&self.key(key), value).await
    }

    /// Removes every key as one reset. All removals are attempted; the first failure is returned.
    pub async fn remove_items(&self, keys: &[&str]) -> Result<(), StorageError> {
        let full_keys: Vec<String> = keys.iter().map(|key| self.key(key)).collect();
        let results = join_all(full_keys.iter().map(|key| self.storage.remove_item(key))).await;
        results.into_iter().collect()
    }
}

impl Storage for Cache {
    fn get_item<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        Box::pin(Cache::get_item(self, key))
    }

    fn set_item<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(Cache::set_item(self, key, value))
    }

    fn remove_item<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move { self.remove_items(&[key]).await })
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
