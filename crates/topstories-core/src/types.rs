use serde::{Deserialize, Serialize};

/// Type alias for Hacker News item identifiers
pub type ItemId = u64;

/// Seconds since the Unix epoch
pub type EpochSecs = i64;

/// Immutable metadata of a selected story.
///
/// Written once by the refresh job and left to expire with the data TTL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Story {
    pub id: ItemId,
    pub title: String,
    /// Submitter handle
    pub by: String,
    /// Submission time
    pub time: EpochSecs,
}

/// Volatile per-story numbers, refreshed opportunistically.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StoryStats {
    pub score: u64,
    pub descendants: u64,
}

/// A stats value as persisted under `item-stats:<id>`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedStats {
    /// Capture time
    pub ts: EpochSecs,
    pub stats: StoryStats,
}

impl CachedStats {
    pub fn age(&self, now: EpochSecs) -> i64 {
        now - self.ts
    }
}

/// The current ranked selection.
///
/// Serialized as a two-element JSON array `[ids, timestamp]` under a single
/// key so readers see either the previous or the next selection in full.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "(Vec<ItemId>, EpochSecs)", into = "(Vec<ItemId>, EpochSecs)")]
pub struct TopStoriesPointer {
    /// Rank order, best first
    pub ids: Vec<ItemId>,
    pub refreshed_at: EpochSecs,
}

impl From<(Vec<ItemId>, EpochSecs)> for TopStoriesPointer {
    fn from((ids, refreshed_at): (Vec<ItemId>, EpochSecs)) -> Self {
        Self { ids, refreshed_at }
    }
}

impl From<TopStoriesPointer> for (Vec<ItemId>, EpochSecs) {
    fn from(pointer: TopStoriesPointer) -> Self {
        (pointer.ids, pointer.refreshed_at)
    }
}

/// One entry of the read view: story metadata joined with its stats.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopStoryView {
    #[serde(flatten)]
    pub story: Story,
    pub score: u64,
    pub descendants: u64,
}

impl TopStoryView {
    pub fn new(story: Story, stats: StoryStats) -> Self {
        Self {
            story,
            score: stats.score,
            descendants: stats.descendants,
        }
    }
}

/// Response body of `GET /top-stories.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopStoriesView {
    pub stories: Vec<TopStoryView>,
    pub when_refreshed: EpochSecs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_wire_format() {
        let pointer = TopStoriesPointer {
            ids: vec![3, 1, 2],
            refreshed_at: 1_700_000_000,
        };
        let json = serde_json::to_string(&pointer).unwrap();
        assert_eq!(json, "[[3,1,2],1700000000]");

        let back: TopStoriesPointer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pointer);
    }

    #[test]
    fn test_cached_stats_wire_format() {
        let cached = CachedStats {
            ts: 42,
            stats: StoryStats {
                score: 7,
                descendants: 3,
            },
        };
        let value = serde_json::to_value(cached).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"ts": 42, "stats": {"score": 7, "descendants": 3}})
        );
    }

    #[test]
    fn test_view_flattens_story() {
        let view = TopStoryView::new(
            Story {
                id: 1,
                title: "Neat thing".into(),
                by: "pg".into(),
                time: 100,
            },
            StoryStats {
                score: 10,
                descendants: 2,
            },
        );
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 1,
                "title": "Neat thing",
                "by": "pg",
                "time": 100,
                "score": 10,
                "descendants": 2,
            })
        );
    }
}
