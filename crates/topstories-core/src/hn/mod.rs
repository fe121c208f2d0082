mod client;
#[cfg(any(test, feature = "test-util"))]
mod scripted;
mod shape;

pub use client::{HnApi, HttpHnClient, DEFAULT_HN_API_BASE};
#[cfg(any(test, feature = "test-util"))]
pub use scripted::ScriptedHn;
pub use shape::{HnItem, ShapeError, StoryIds, Validate};
