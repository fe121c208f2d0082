use crate::clock::Clock;
use crate::error::{Result, TopStoriesError};
use crate::hn::{HnApi, HnItem};
use crate::storage::{KvStore, StoryStore};
use crate::types::{EpochSecs, ItemId};
use std::fmt;
use std::sync::Arc;

/// Editorial rules and pacing for the refresh job.
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    /// Stop after this many accepted stories.
    pub desired_count: usize,
    /// Stories older than this are skipped.
    pub max_age_secs: i64,
    /// Guarded refreshes are refused within this many seconds of the last one.
    pub min_interval_secs: i64,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            desired_count: 3,
            max_age_secs: 172_800,
            min_interval_secs: 600,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotStory,
    DeadOrDeleted,
    AskHn,
    TooOld,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotStory => "not story",
            Self::DeadOrDeleted => "dead or deleted",
            Self::AskHn => "ask hn",
            Self::TooOld => "too old",
        };
        f.write_str(s)
    }
}

/// First filter the item trips, checked in a fixed order.
pub fn skip_reason(item: &HnItem, now: EpochSecs, max_age_secs: i64) -> Option<SkipReason> {
    if item.kind != "story" {
        return Some(SkipReason::NotStory);
    }
    if item.is_dead_or_deleted() {
        return Some(SkipReason::DeadOrDeleted);
    }
    if item.title.to_lowercase().starts_with("ask hn:") {
        return Some(SkipReason::AskHn);
    }
    if now - item.time > max_age_secs {
        return Some(SkipReason::TooOld);
    }
    None
}

/// Result of one completed refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub accepted: Vec<ItemId>,
    pub skipped: usize,
    pub refreshed_at: EpochSecs,
}

/// Recomputes the current top-story selection.
pub struct TopStoriesRefresher<S: KvStore, H: HnApi> {
    store: StoryStore<S>,
    hn: Arc<H>,
    clock: Arc<dyn Clock>,
    policy: RefreshPolicy,
}

impl<S: KvStore, H: HnApi> TopStoriesRefresher<S, H> {
    pub fn new(
        store: StoryStore<S>,
        hn: Arc<H>,
        clock: Arc<dyn Clock>,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            store,
            hn,
            clock,
            policy,
        }
    }

    /// Refuse when the last refresh is too recent. A missing or unreadable
    /// pointer counts as "never refreshed".
    pub fn check_rate_limit(&self) -> Result<()> {
        let last = match self.store.current_top_stories() {
            Ok(pointer) => pointer.refreshed_at,
            Err(e) => {
                log::debug!("rate-limit: no previous refresh ({})", e);
                0
            }
        };
        let since = self.clock.now() - last;
        if since <= self.policy.min_interval_secs {
            return Err(TopStoriesError::rate_limited(
                "last updated quite recently, refusing to update",
            ));
        }
        Ok(())
    }

    /// Refresh behind the rate-limit guard (manual trigger).
    pub async fn refresh_guarded(&self) -> Result<RefreshOutcome> {
        self.check_rate_limit()?;
        self.refresh().await
    }

    /// Unguarded refresh (scheduled trigger).
    ///
    /// Story records are written one by one as they are accepted, and the
    /// pointer last, so every ID in a visible pointer has a record behind it.
    /// Any upstream failure aborts before the pointer is touched.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let now = self.clock.now();
        let candidates = self.hn.best_story_ids().await?;

        let mut accepted = Vec::with_capacity(self.policy.desired_count);
        let mut skipped = 0;

        for item_id in candidates {
            if accepted.len() >= self.policy.desired_count {
                break;
            }

            let item = self.hn.item(item_id).await?;

            if let Some(reason) = skip_reason(&item, now, self.policy.max_age_secs) {
                log::info!(
                    "skipping item: {} id={} title={:?} type={} age={}",
                    reason,
                    item.id,
                    item.title,
                    item.kind,
                    now - item.time
                );
                skipped += 1;
                continue;
            }

            log::info!("accepting item id={} title={:?}", item.id, item.title);
            self.store.set_story(&item.to_story())?;
            accepted.push(item.id);
        }

        let refreshed_at = self.clock.now();
        self.store
            .set_current_top_stories(accepted.clone(), refreshed_at)?;
        log::info!(
            "refreshed top stories: accepted={:?} skipped={}",
            accepted,
            skipped
        );

        Ok(RefreshOutcome {
            accepted,
            skipped,
            refreshed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ErrorKind;
    use crate::hn::ScriptedHn;
    use crate::storage::MemoryKvStore;
    use proptest::prelude::*;

    const NOW: i64 = 1_700_000_000;

    struct Fixture {
        refresher: TopStoriesRefresher<MemoryKvStore, ScriptedHn>,
        store: StoryStore<MemoryKvStore>,
        hn: Arc<ScriptedHn>,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let _ = env_logger::builder().is_test(true).try_init();
        let clock = Arc::new(ManualClock::new(NOW));
        let store = StoryStore::new(Arc::new(MemoryKvStore::with_clock(clock.clone())));
        let hn = Arc::new(ScriptedHn::new());
        let refresher = TopStoriesRefresher::new(
            store.clone(),
            hn.clone(),
            clock.clone(),
            RefreshPolicy::default(),
        );
        Fixture {
            refresher,
            store,
            hn,
            clock,
        }
    }

    #[tokio::test]
    async fn test_filters_example() {
        let f = fixture();
        f.hn.set_ids(Some(vec![1, 2, 3]));
        f.hn.put_item(ScriptedHn::story(1, "Neat thing", NOW - 100));
        f.hn.put_item(ScriptedHn::story(2, "Ask HN: advice?", NOW - 100));
        let mut dead = ScriptedHn::story(3, "Gone", NOW - 100);
        dead.dead = Some(true);
        f.hn.put_item(dead);

        let outcome = f.refresher.refresh().await.unwrap();
        assert_eq!(outcome.accepted, vec![1]);
        assert_eq!(outcome.skipped, 2);

        let pointer = f.store.current_top_stories().unwrap();
        assert_eq!(pointer.ids, vec![1]);
        assert_eq!(pointer.refreshed_at, NOW);
        assert_eq!(f.store.get_story(1).unwrap().title, "Neat thing");
        assert!(f.store.get_story(2).is_err());
    }

    #[tokio::test]
    async fn test_stops_at_desired_count_in_rank_order() {
        let f = fixture();
        f.hn.set_ids(Some(vec![10, 11, 12, 13, 14]));
        for id in 10..=14 {
            f.hn.put_item(ScriptedHn::story(id, &format!("Story {}", id), NOW - 10));
        }

        let outcome = f.refresher.refresh().await.unwrap();
        assert_eq!(outcome.accepted, vec![10, 11, 12]);
        // Candidates past the cut are never fetched
        assert_eq!(f.hn.item_calls(13), 0);
        assert_eq!(f.hn.item_calls(14), 0);
    }

    #[tokio::test]
    async fn test_short_selection_is_not_an_error() {
        let f = fixture();
        f.hn.set_ids(Some(vec![1, 2]));
        let mut job = ScriptedHn::story(1, "Hiring", NOW);
        job.kind = "job".into();
        f.hn.put_item(job);
        f.hn.put_item(ScriptedHn::story(2, "Ancient", NOW - 172_801));

        let outcome = f.refresher.refresh().await.unwrap();
        assert!(outcome.accepted.is_empty());
        assert!(f.store.current_top_stories().unwrap().ids.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_item_aborts_without_pointer_update() {
        let f = fixture();
        f.store.set_current_top_stories(vec![99], NOW - 5_000).unwrap();

        f.hn.set_ids(Some(vec![1, 2]));
        f.hn.put_item(ScriptedHn::story(1, "Fine", NOW));
        f.hn.malformed_item(2);

        assert!(f.refresher.refresh().await.is_err());
        let pointer = f.store.current_top_stories().unwrap();
        assert_eq!(pointer.ids, vec![99]);
        assert_eq!(pointer.refreshed_at, NOW - 5_000);
    }

    #[tokio::test]
    async fn test_list_failure_aborts() {
        let f = fixture();
        f.hn.set_ids(None);
        let err = f.refresher.refresh().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(f.store.current_top_stories().is_err());
    }

    #[tokio::test]
    async fn test_rate_limit_guard() {
        let f = fixture();
        f.hn.set_ids(Some(vec![1]));
        f.hn.put_item(ScriptedHn::story(1, "Neat thing", NOW));

        // Never refreshed: allowed
        f.refresher.refresh_guarded().await.unwrap();

        f.clock.advance(600);
        let err = f.refresher.refresh_guarded().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);

        f.clock.advance(1);
        f.refresher.refresh_guarded().await.unwrap();
        assert_eq!(f.store.current_top_stories().unwrap().refreshed_at, NOW + 601);
    }

    #[tokio::test]
    async fn test_corrupt_pointer_does_not_block_guarded_refresh() {
        let f = fixture();
        f.store
            .kv()
            .put("current-top-stories", "not json", None)
            .unwrap();
        assert!(f.refresher.check_rate_limit().is_ok());
    }

    #[tokio::test]
    async fn test_unguarded_refresh_ignores_rate_limit() {
        let f = fixture();
        f.hn.set_ids(Some(vec![1]));
        f.hn.put_item(ScriptedHn::story(1, "Neat thing", NOW));

        f.refresher.refresh().await.unwrap();
        f.refresher.refresh().await.unwrap();
        assert_eq!(f.hn.list_calls(), 2);
    }

    #[test]
    fn test_skip_order() {
        let mut item = ScriptedHn::story(1, "Ask HN: old and dead poll", NOW - 999_999);
        item.kind = "poll".into();
        item.dead = Some(true);
        assert_eq!(skip_reason(&item, NOW, 172_800), Some(SkipReason::NotStory));

        item.kind = "story".into();
        assert_eq!(skip_reason(&item, NOW, 172_800), Some(SkipReason::DeadOrDeleted));

        item.dead = None;
        assert_eq!(skip_reason(&item, NOW, 172_800), Some(SkipReason::AskHn));

        item.title = "Show HN: something".into();
        assert_eq!(skip_reason(&item, NOW, 172_800), Some(SkipReason::TooOld));

        item.time = NOW - 172_800;
        assert_eq!(skip_reason(&item, NOW, 172_800), None);
    }

    fn arb_item() -> impl Strategy<Value = HnItem> {
        (
            prop_oneof![Just("story"), Just("job"), Just("poll"), Just("comment")],
            prop_oneof![Just("Ask HN: "), Just("ASK hn:"), Just("Show HN: "), Just("")],
            "[a-zA-Z ]{0,20}",
            proptest::option::of(any::<bool>()),
            proptest::option::of(any::<bool>()),
            0i64..400_000,
        )
            .prop_map(|(kind, prefix, rest, dead, deleted, age)| {
                let mut item = ScriptedHn::story(1, &format!("{}{}", prefix, rest), NOW - age);
                item.kind = kind.to_string();
                item.dead = dead;
                item.deleted = deleted;
                item
            })
    }

    proptest! {
        #[test]
        fn prop_accepted_items_pass_every_rule(item in arb_item()) {
            if skip_reason(&item, NOW, 172_800).is_none() {
                prop_assert_eq!(item.kind.as_str(), "story");
                prop_assert!(!item.is_dead_or_deleted());
                prop_assert!(!item.title.to_lowercase().starts_with("ask hn:"));
                prop_assert!(NOW - item.time <= 172_800);
            }
        }
    }
}
