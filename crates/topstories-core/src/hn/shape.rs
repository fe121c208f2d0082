//! Validation of raw upstream payloads into typed records.

use crate::types::{EpochSecs, ItemId, Story, StoryStats};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A payload did not have the expected fields or types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown data shape returned from hn api for {subject}: {reason}")]
pub struct ShapeError {
    pub subject: String,
    pub reason: String,
}

impl ShapeError {
    pub fn new(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            reason: reason.into(),
        }
    }

    /// Re-label the error with a more specific subject, e.g. `item (42)`.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }
}

/// Turn an untyped JSON payload into a typed record, or fail.
pub trait Validate: Sized {
    fn validate(raw: Value) -> Result<Self, ShapeError>;
}

/// One record from `/v0/item/<id>.json`.
///
/// Only the fields this service reads are required; unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HnItem {
    pub by: String,
    pub descendants: Option<u64>,
    pub id: ItemId,
    pub kids: Option<Vec<ItemId>>,
    pub score: u64,
    pub time: EpochSecs,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<String>,
    pub url: Option<String>,
    pub deleted: Option<bool>,
    pub dead: Option<bool>,
    pub parent: Option<ItemId>,
}

impl HnItem {
    pub fn is_dead_or_deleted(&self) -> bool {
        self.dead.unwrap_or(false) || self.deleted.unwrap_or(false)
    }

    pub fn stats(&self) -> StoryStats {
        StoryStats {
            score: self.score,
            descendants: self.descendants.unwrap_or(0),
        }
    }

    pub fn to_story(&self) -> Story {
        Story {
            id: self.id,
            title: self.title.clone(),
            by: self.by.clone(),
            time: self.time,
        }
    }
}

impl Validate for HnItem {
    fn validate(raw: Value) -> Result<Self, ShapeError> {
        if !raw.is_object() {
            return Err(ShapeError::new("item", format!("expected an object, got {}", raw)));
        }
        serde_json::from_value(raw).map_err(|e| ShapeError::new("item", e.to_string()))
    }
}

/// The ranked ID list from `/v0/beststories.json`, best first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryIds(pub Vec<ItemId>);

impl Validate for StoryIds {
    fn validate(raw: Value) -> Result<Self, ShapeError> {
        let Value::Array(values) = raw else {
            return Err(ShapeError::new("story list", "expected an array"));
        };
        if values.is_empty() {
            return Err(ShapeError::new("story list", "empty list"));
        }
        values
            .iter()
            .map(|v| {
                v.as_u64()
                    .ok_or_else(|| ShapeError::new("story list", format!("not an item id: {}", v)))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(StoryIds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_item() -> Value {
        json!({
            "by": "dhouston",
            "descendants": 71,
            "id": 8863,
            "kids": [9224, 8917],
            "score": 104,
            "time": 1175714200,
            "title": "My YC app: Dropbox - Throw away your USB drive",
            "type": "story",
            "url": "http://www.getdropbox.com/u/2/screencast.html"
        })
    }

    #[test]
    fn test_valid_item() {
        let item = HnItem::validate(full_item()).unwrap();
        assert_eq!(item.id, 8863);
        assert_eq!(item.kind, "story");
        assert!(!item.is_dead_or_deleted());
        assert_eq!(
            item.stats(),
            StoryStats {
                score: 104,
                descendants: 71
            }
        );
        assert_eq!(item.to_story().by, "dhouston");
    }

    #[test]
    fn test_optional_fields_default() {
        let mut raw = full_item();
        let obj = raw.as_object_mut().unwrap();
        obj.remove("descendants");
        obj.remove("kids");
        obj.remove("url");
        obj.insert("unknown_field".into(), json!("ignored"));

        let item = HnItem::validate(raw).unwrap();
        assert_eq!(item.stats().descendants, 0);
        assert_eq!(item.kids, None);
    }

    #[test]
    fn test_missing_required_field() {
        let mut raw = full_item();
        raw.as_object_mut().unwrap().remove("title");
        let err = HnItem::validate(raw).unwrap_err();
        assert!(err.reason.contains("title"), "reason was {}", err.reason);
    }

    #[test]
    fn test_wrong_field_type() {
        let mut raw = full_item();
        raw["score"] = json!("a lot");
        assert!(HnItem::validate(raw).is_err());
    }

    #[test]
    fn test_null_item() {
        // Upstream returns `null` for unknown ids
        let err = HnItem::validate(Value::Null).unwrap_err();
        assert_eq!(err.subject, "item");
        assert_eq!(
            err.with_subject("item (5)").to_string(),
            "unknown data shape returned from hn api for item (5): expected an object, got null"
        );
    }

    #[test]
    fn test_dead_flags() {
        let mut raw = full_item();
        raw["dead"] = json!(true);
        assert!(HnItem::validate(raw).unwrap().is_dead_or_deleted());

        let mut raw = full_item();
        raw["deleted"] = json!(true);
        assert!(HnItem::validate(raw).unwrap().is_dead_or_deleted());
    }

    #[test]
    fn test_story_ids() {
        assert_eq!(
            StoryIds::validate(json!([3, 1, 2])).unwrap(),
            StoryIds(vec![3, 1, 2])
        );
        assert!(StoryIds::validate(json!([])).is_err());
        assert!(StoryIds::validate(json!({"ids": [1]})).is_err());
        assert!(StoryIds::validate(json!(["1"])).is_err());
        assert!(StoryIds::validate(json!([1, -2])).is_err());
    }
}
