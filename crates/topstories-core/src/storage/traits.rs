use crate::error::Result;
use std::time::Duration;

/// Key-value store with per-key expiration.
///
/// Only single-key atomicity is assumed: a `put` is visible in full or not at
/// all, and concurrent writers to the same key are last-write-wins.
pub trait KvStore: Send + Sync {
    /// Fetch a live value. Expired entries read as `None`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, replacing any previous one. `ttl = None` never expires.
    fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Remove a key. Missing keys are not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// Physically drop expired entries, returning how many were removed.
    fn purge_expired(&self) -> Result<usize>;
}

impl<T: KvStore + ?Sized> KvStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        (**self).put(key, value, ttl)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }

    fn purge_expired(&self) -> Result<usize> {
        (**self).purge_expired()
    }
}
