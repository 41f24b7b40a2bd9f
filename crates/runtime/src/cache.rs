use std::{future::Future, time::Duration};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache error: {0}")]
    Store(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Shared store of resolved field payloads. Writes are full overwrites of a key.
pub trait FieldCache: Send + Sync + 'static {
    fn get(&self, key: &str) -> impl Future<Output = CacheResult<Option<Vec<u8>>>> + Send;

    /// Kept forever when `ttl` is `None`.
    fn put(&self, key: &str, bytes: Vec<u8>, ttl: Option<Duration>) -> impl Future<Output = CacheResult<()>> + Send;
}
