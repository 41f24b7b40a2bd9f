use std::time::{Duration, Instant};

use runtime::cache::{CacheError, CacheResult, FieldCache};

#[derive(Clone)]
struct CacheEntry {
    bytes: Vec<u8>,
    expires_at: Option<Instant>,
}

/// Field cache bounded by entry count. Expired entries are dropped when read.
pub struct InMemoryFieldCache {
    inner: mini_moka::sync::Cache<String, CacheEntry>,
    // for testing
    now: Box<dyn Fn() -> Instant + Send + Sync>,
    failure: Option<String>,
}

impl InMemoryFieldCache {
    pub fn new(capacity: u64) -> Self {
        InMemoryFieldCache {
            inner: mini_moka::sync::Cache::builder().max_capacity(capacity).build(),
            now: Box::new(Instant::now),
            failure: None,
        }
    }

    /// A cache failing every read and write, as an unreachable cache server would.
    pub fn failing(message: impl Into<String>) -> Self {
        InMemoryFieldCache {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn new_with_time(capacity: u64, now: impl Fn() -> Instant + Send + Sync + 'static) -> Self {
        InMemoryFieldCache {
            inner: mini_moka::sync::Cache::builder().max_capacity(capacity).build(),
            now: Box::new(now),
            failure: None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read(key).is_some()
    }

    fn check(&self) -> CacheResult<()> {
        match &self.failure {
            Some(message) => Err(CacheError::Store(message.clone())),
            None => Ok(()),
        }
    }

    fn read(&self, key: &str) -> Option<Vec<u8>> {
        let key = key.to_string();
        let entry = self.inner.get(&key)?;

        match entry.expires_at {
            Some(expires_at) if expires_at <= (self.now)() => {
                self.inner.invalidate(&key);
                None
            }
            _ => Some(entry.bytes),
        }
    }
}

impl Default for InMemoryFieldCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl FieldCache for InMemoryFieldCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.check()?;
        Ok(self.read(key))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()> {
        self.check()?;
        let expires_at = ttl.and_then(|ttl| (self.now)().checked_add(ttl));
        self.inner.insert(key.to_string(), CacheEntry { bytes, expires_at });
        Ok(())
    }
}
