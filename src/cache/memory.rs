use super::storage::{Storage, StorageError};
use futures::future::{self, BoxFuture};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Process-local storage. State is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a fully-qualified key without going through a cache.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        Box::pin(future::ready(Ok(self.raw(key))))
    }

    fn set_item<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Box::pin(future::ready(Ok(())))
    }

    fn remove_item<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        self.items.lock().remove(key);
        Box::pin(future::ready(Ok(())))
    }
}
