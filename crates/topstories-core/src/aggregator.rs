use crate::error::Result;
use crate::hn::HnApi;
use crate::stats_cache::SemiFreshStats;
use crate::storage::{KvStore, StoryStore};
use crate::tasks::BackgroundTasks;
use crate::types::{ItemId, TopStoriesView, TopStoryView};
use futures::future::{try_join, try_join_all};

/// Builds the combined read view of the current selection.
pub struct TopStoriesReader<S: KvStore + 'static, H: HnApi> {
    store: StoryStore<S>,
    stats: SemiFreshStats<S, H>,
    tasks: BackgroundTasks,
}

impl<S: KvStore + 'static, H: HnApi> TopStoriesReader<S, H> {
    pub fn new(store: StoryStore<S>, stats: SemiFreshStats<S, H>, tasks: BackgroundTasks) -> Self {
        Self {
            store,
            stats,
            tasks,
        }
    }

    /// Load the pointer, then join metadata and stats for every story
    /// concurrently. Cache write-backs are handed to the background tasks
    /// and never awaited here.
    pub async fn top_stories_view(&self) -> Result<TopStoriesView> {
        let pointer = self.store.current_top_stories()?;

        let stories = try_join_all(pointer.ids.iter().map(|&id| self.story_view(id))).await?;

        Ok(TopStoriesView {
            stories,
            when_refreshed: pointer.refreshed_at,
        })
    }

    /// Metadata and stats for one story are requested together.
    async fn story_view(&self, id: ItemId) -> Result<TopStoryView> {
        let ((stats, refresh), story) =
            try_join(self.stats.get_stats(id), async { self.store.get_story(id) }).await?;

        if !refresh.is_noop() {
            let store = self.store.clone();
            self.tasks
                .spawn("item-stats-write", async move { refresh.apply(&store) });
        }

        Ok(TopStoryView::new(story, stats))
    }
}
