use crate::error::{Result, TopStoriesError};
use crate::hn::shape::{HnItem, StoryIds, Validate};
use crate::types::ItemId;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_HN_API_BASE: &str = "https://hacker-news.firebaseio.com";

/// Read-only view of the Hacker News API.
#[async_trait]
pub trait HnApi: Send + Sync {
    /// Ranked candidate IDs, best first.
    async fn best_story_ids(&self) -> Result<Vec<ItemId>>;

    /// A single validated item record.
    async fn item(&self, id: ItemId) -> Result<HnItem>;
}

#[async_trait]
impl<T: HnApi + ?Sized> HnApi for std::sync::Arc<T> {
    async fn best_story_ids(&self) -> Result<Vec<ItemId>> {
        (**self).best_story_ids().await
    }

    async fn item(&self, id: ItemId) -> Result<HnItem> {
        (**self).item(id).await
    }
}

/// [`HnApi`] over HTTP.
pub struct HttpHnClient {
    client: Client,
    base_url: String,
}

impl HttpHnClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("topstories/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let res = self.client.get(&url).send().await?;
        if !res.status().is_success() {
            return Err(TopStoriesError::Upstream(format!(
                "non-ok response from hn api: {}",
                res.status()
            )));
        }
        Ok(res.json::<Value>().await?)
    }
}

#[async_trait]
impl HnApi for HttpHnClient {
    async fn best_story_ids(&self) -> Result<Vec<ItemId>> {
        let raw = self.fetch_json("/v0/beststories.json").await?;
        let StoryIds(ids) = StoryIds::validate(raw)?;
        Ok(ids)
    }

    async fn item(&self, id: ItemId) -> Result<HnItem> {
        let raw = self.fetch_json(&format!("/v0/item/{}.json", id)).await?;
        HnItem::validate(raw)
            .map_err(|e| e.with_subject(format!("item ({})", id)).into())
    }
}
