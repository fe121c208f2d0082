use crate::clock::{Clock, SystemClock};
use crate::error::{Result, TopStoriesError};
use crate::storage::redb_storage::Envelope;
use crate::storage::traits::KvStore;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// In-process store with the same expiry semantics as [`super::RedbKvStore`].
/// Nothing survives a restart.
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, Envelope>>,
    clock: Arc<dyn Clock>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> TopStoriesError {
    TopStoriesError::Validation("memory store lock poisoned".into())
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        let now = self.clock.now();
        Ok(entries
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.clone()))
    }

    fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let envelope = Envelope::new(value, ttl, self.clock.now());
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), envelope);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        Ok(before - entries.len())
    }
}
