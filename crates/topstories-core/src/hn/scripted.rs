use crate::error::{Result, TopStoriesError};
use crate::hn::client::HnApi;
use crate::hn::shape::{HnItem, ShapeError};
use crate::types::{EpochSecs, ItemId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Scripted {
    Item(HnItem),
    Unavailable,
    Malformed,
}

/// An in-memory [`HnApi`] whose answers are set up by the caller.
///
/// Unknown IDs answer like an upstream 404. Every call is counted.
#[derive(Debug, Default)]
pub struct ScriptedHn {
    ids: Mutex<Option<Vec<ItemId>>>,
    items: Mutex<HashMap<ItemId, Scripted>>,
    list_calls: AtomicUsize,
    item_calls: Mutex<HashMap<ItemId, usize>>,
}

impl ScriptedHn {
    pub fn new() -> Self {
        Self::default()
    }

    /// A plain live story.
    pub fn story(id: ItemId, title: &str, time: EpochSecs) -> HnItem {
        HnItem {
            by: "pg".to_string(),
            descendants: Some(0),
            id,
            kids: None,
            score: 1,
            time,
            title: title.to_string(),
            kind: "story".to_string(),
            text: None,
            url: Some(format!("https://example.com/{}", id)),
            deleted: None,
            dead: None,
            parent: None,
        }
    }

    /// `None` makes the list endpoint fail.
    pub fn set_ids(&self, ids: Option<Vec<ItemId>>) {
        *self.ids.lock().unwrap() = ids;
    }

    pub fn put_item(&self, item: HnItem) {
        self.items
            .lock()
            .unwrap()
            .insert(item.id, Scripted::Item(item));
    }

    /// Update score and comment count of an already scripted item.
    pub fn set_stats(&self, id: ItemId, score: u64, descendants: u64) {
        if let Some(Scripted::Item(item)) = self.items.lock().unwrap().get_mut(&id) {
            item.score = score;
            item.descendants = Some(descendants);
        }
    }

    /// Answer with a transport-level failure.
    pub fn fail_item(&self, id: ItemId) {
        self.items.lock().unwrap().insert(id, Scripted::Unavailable);
    }

    /// Answer with a payload that does not validate.
    pub fn malformed_item(&self, id: ItemId) {
        self.items.lock().unwrap().insert(id, Scripted::Malformed);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn item_calls(&self, id: ItemId) -> usize {
        self.item_calls.lock().unwrap().get(&id).copied().unwrap_or(0)
    }

    pub fn total_item_calls(&self) -> usize {
        self.item_calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl HnApi for ScriptedHn {
    async fn best_story_ids(&self) -> Result<Vec<ItemId>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.ids
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| TopStoriesError::Upstream("non-ok response from hn api: 503".into()))
    }

    async fn item(&self, id: ItemId) -> Result<HnItem> {
        *self.item_calls.lock().unwrap().entry(id).or_insert(0) += 1;
        let scripted = self.items.lock().unwrap().get(&id).cloned();
        match scripted {
            Some(Scripted::Item(item)) => Ok(item),
            Some(Scripted::Unavailable) => Err(TopStoriesError::Upstream(
                "non-ok response from hn api: 502 Bad Gateway".into(),
            )),
            Some(Scripted::Malformed) => Err(ShapeError::new(
                format!("item ({})", id),
                "missing field `title`",
            )
            .into()),
            None => Err(TopStoriesError::Upstream(
                "non-ok response from hn api: 404 Not Found".into(),
            )),
        }
    }
}
