use super::storage::{Storage, StorageError};
use futures::future::BoxFuture;
use std::path::Path;

/// Durable storage backed by an embedded sled database.
///
/// Every write is flushed before it resolves so a restarted process resumes with the last
/// sequence token it was handed.
#[derive(Debug, Clone)]
pub struct SledStorage {
    db: sled::Db,
}

impl SledStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }
}

impl Storage for SledStorage {
    fn get_item<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        Box::pin(async move {
            match self.db.get(key)? {
                Some(value) => String::from_utf8(value.to_vec())
                    .map(Some)
                    .map_err(|_| StorageError::InvalidUtf8 {
                        key: key.to_string(),
                    }),
                None => Ok(None),
            }
        })
    }

    fn set_item<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.db.insert(key, value.as_bytes())?;
            self.db.flush()?;
            Ok(())
        })
    }

    fn remove_item<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.db.remove(key)?;
            self.db.flush()?;
            Ok(())
        })
    }
}
