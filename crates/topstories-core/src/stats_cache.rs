use crate::clock::Clock;
use crate::error::Result;
use crate::hn::HnApi;
use crate::storage::{KvStore, StoryStore};
use crate::types::{CachedStats, ItemId, StoryStats};
use std::sync::Arc;

/// Freshness settings for cached stats.
#[derive(Debug, Clone)]
pub struct StatsPolicy {
    /// Cached stats younger than this are served without asking upstream.
    pub stale_after_secs: i64,
}

impl Default for StatsPolicy {
    fn default() -> Self {
        Self {
            stale_after_secs: 600,
        }
    }
}

/// The deferred half of a stats lookup: what, if anything, must be written
/// back to the store. Run it off the response path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsRefresh {
    Noop,
    Persist { item_id: ItemId, entry: CachedStats },
}

impl StatsRefresh {
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::Noop)
    }

    /// Perform the write. A single attempt; the next stale read retries.
    pub fn apply<S: KvStore>(self, store: &StoryStore<S>) -> Result<()> {
        match self {
            Self::Noop => Ok(()),
            Self::Persist { item_id, entry } => store.put_stats(item_id, &entry),
        }
    }
}

/// Read-through cache for score and comment count with stale fallback.
///
/// Fresh entries are served directly. Stale or missing entries trigger one
/// upstream fetch; if that fails, a stale entry is still served, and only a
/// total miss surfaces the error.
pub struct SemiFreshStats<S: KvStore, H: HnApi> {
    store: StoryStore<S>,
    hn: Arc<H>,
    clock: Arc<dyn Clock>,
    policy: StatsPolicy,
}

impl<S: KvStore, H: HnApi> SemiFreshStats<S, H> {
    pub fn new(store: StoryStore<S>, hn: Arc<H>, clock: Arc<dyn Clock>, policy: StatsPolicy) -> Self {
        Self {
            store,
            hn,
            clock,
            policy,
        }
    }

    pub async fn get_stats(&self, item_id: ItemId) -> Result<(StoryStats, StatsRefresh)> {
        let now = self.clock.now();

        let fallback = match self.store.cached_stats(item_id)? {
            Some(cached) if cached.age(now) < self.policy.stale_after_secs => {
                log::debug!("semi-fresh-stats:hit item_id={}", item_id);
                return Ok((cached.stats, StatsRefresh::Noop));
            }
            Some(cached) => {
                log::debug!(
                    "semi-fresh-stats:stale item_id={} age={}",
                    item_id,
                    cached.age(now)
                );
                Some(cached.stats)
            }
            None => {
                log::debug!("semi-fresh-stats:miss item_id={}", item_id);
                None
            }
        };

        match self.hn.item(item_id).await {
            Ok(item) => {
                let stats = item.stats();
                let entry = CachedStats { ts: now, stats };
                Ok((stats, StatsRefresh::Persist { item_id, entry }))
            }
            Err(e) => match fallback {
                Some(stats) => {
                    log::warn!(
                        "semi-fresh-stats:fallback item_id={} error={}",
                        item_id,
                        e
                    );
                    Ok((stats, StatsRefresh::Noop))
                }
                None => Err(e),
            },
        }
    }
}
