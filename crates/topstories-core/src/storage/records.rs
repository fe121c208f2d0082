use crate::error::{Result, TopStoriesError};
use crate::storage::traits::KvStore;
use crate::types::{CachedStats, EpochSecs, ItemId, Story, TopStoriesPointer};
use std::sync::Arc;
use std::time::Duration;

/// Retention for story metadata and cached stats: 7 days.
pub const MAX_DATA_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const CURRENT_TOP_STORIES_KEY: &str = "current-top-stories";

fn story_key(id: ItemId) -> String {
    format!("story:{}", id)
}

fn stats_key(id: ItemId) -> String {
    format!("item-stats:{}", id)
}

/// Typed access to the records kept in a [`KvStore`].
///
/// Values are JSON; the key layout is
/// `current-top-stories`, `story:<id>` and `item-stats:<id>`.
pub struct StoryStore<S: KvStore> {
    kv: Arc<S>,
}

impl<S: KvStore> Clone for StoryStore<S> {
    fn clone(&self) -> Self {
        Self {
            kv: self.kv.clone(),
        }
    }
}

impl<S: KvStore> StoryStore<S> {
    pub fn new(kv: Arc<S>) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &Arc<S> {
        &self.kv
    }

    /// Fails with `ServiceUnavailable` when no refresh has ever completed.
    pub fn current_top_stories(&self) -> Result<TopStoriesPointer> {
        let json = self
            .kv
            .get(CURRENT_TOP_STORIES_KEY)?
            .ok_or_else(|| TopStoriesError::service_unavailable("no current top stories"))?;
        serde_json::from_str(&json)
            .map_err(|_| TopStoriesError::server("corrupt top stories data"))
    }

    /// Replace the pointer. Never expires.
    pub fn set_current_top_stories(&self, ids: Vec<ItemId>, now: EpochSecs) -> Result<()> {
        let pointer = TopStoriesPointer {
            ids,
            refreshed_at: now,
        };
        let json = serde_json::to_string(&pointer)?;
        self.kv.put(CURRENT_TOP_STORIES_KEY, &json, None)
    }

    pub fn set_story(&self, story: &Story) -> Result<()> {
        let json = serde_json::to_string(story)?;
        self.kv.put(&story_key(story.id), &json, Some(MAX_DATA_TTL))
    }

    /// A story named by the pointer must exist, so absence is a server error.
    pub fn get_story(&self, id: ItemId) -> Result<Story> {
        let json = self
            .kv
            .get(&story_key(id))?
            .ok_or_else(|| TopStoriesError::server("story unavailable"))?;
        serde_json::from_str(&json).map_err(|_| TopStoriesError::server("corrupt story data"))
    }

    /// Unparsable entries read as a miss so the next fetch overwrites them.
    pub fn cached_stats(&self, id: ItemId) -> Result<Option<CachedStats>> {
        let Some(json) = self.kv.get(&stats_key(id))? else {
            return Ok(None);
        };
        match serde_json::from_str(&json) {
            Ok(cached) => Ok(Some(cached)),
            Err(e) => {
                log::warn!("item-stats:corrupt item_id={} error={}", id, e);
                Ok(None)
            }
        }
    }

    pub fn put_stats(&self, id: ItemId, cached: &CachedStats) -> Result<()> {
        let json = serde_json::to_string(cached)?;
        self.kv.put(&stats_key(id), &json, Some(MAX_DATA_TTL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ErrorKind;
    use crate::storage::MemoryKvStore;
    use crate::types::StoryStats;

    fn store() -> (StoryStore<MemoryKvStore>, Arc<MemoryKvStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let kv = Arc::new(MemoryKvStore::with_clock(clock.clone()));
        (StoryStore::new(kv.clone()), kv, clock)
    }

    fn story(id: ItemId) -> Story {
        Story {
            id,
            title: format!("Story {}", id),
            by: "dang".into(),
            time: 999_000,
        }
    }

    #[test]
    fn test_missing_pointer_is_service_unavailable() {
        let (store, _, _) = store();
        let err = store.current_top_stories().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(err.to_string(), "no current top stories");
    }

    #[test]
    fn test_pointer_roundtrip_and_raw_layout() {
        let (store, kv, _) = store();
        store.set_current_top_stories(vec![5, 2], 77).unwrap();

        let pointer = store.current_top_stories().unwrap();
        assert_eq!(pointer.ids, vec![5, 2]);
        assert_eq!(pointer.refreshed_at, 77);
        assert_eq!(
            kv.get("current-top-stories").unwrap().as_deref(),
            Some("[[5,2],77]")
        );
    }

    #[test]
    fn test_corrupt_pointer_is_server_error() {
        let (store, kv, _) = store();
        kv.put("current-top-stories", "{not json", None).unwrap();
        let err = store.current_top_stories().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServerError);
    }

    #[test]
    fn test_story_roundtrip_and_expiry() {
        let (store, _, clock) = store();
        store.set_story(&story(8)).unwrap();
        assert_eq!(store.get_story(8).unwrap(), story(8));

        clock.advance(MAX_DATA_TTL.as_secs() as i64);
        let err = store.get_story(8).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServerError);
        assert_eq!(err.to_string(), "story unavailable");
    }

    #[test]
    fn test_corrupt_story_is_server_error() {
        let (store, kv, _) = store();
        kv.put("story:3", "]]", None).unwrap();
        let err = store.get_story(3).unwrap_err();
        assert_eq!(err.to_string(), "corrupt story data");
    }

    #[test]
    fn test_stats_roundtrip_and_corrupt_as_miss() {
        let (store, kv, _) = store();
        assert_eq!(store.cached_stats(4).unwrap(), None);

        let cached = CachedStats {
            ts: 10,
            stats: StoryStats {
                score: 1,
                descendants: 0,
            },
        };
        store.put_stats(4, &cached).unwrap();
        assert_eq!(store.cached_stats(4).unwrap(), Some(cached));

        kv.put("item-stats:4", "garbage", None).unwrap();
        assert_eq!(store.cached_stats(4).unwrap(), None);
    }
}
