use futures::future::BoxFuture;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Stored value for {key} is not valid UTF-8")]
    InvalidUtf8 { key: String },
    #[cfg(feature = "sled-storage")]
    #[error("Sled error: {0}")]
    Sled(#[from] sled::Error),
}

/// Minimal persistent key-value contract the cache is built on.
pub trait Storage: Send + Sync {
    fn get_item<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>>;

    fn set_item<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StorageError>>;

    fn remove_item<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>>;
}
