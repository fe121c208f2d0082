pub mod aggregator;
pub mod clock;
pub mod error;
pub mod hn;
pub mod refresh;
pub mod stats_cache;
pub mod storage;
pub mod tasks;
pub mod types;

pub use aggregator::TopStoriesReader;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ErrorKind, Result, TopStoriesError};
pub use hn::{HnApi, HnItem, HttpHnClient, ShapeError, Validate, DEFAULT_HN_API_BASE};
pub use refresh::{skip_reason, RefreshOutcome, RefreshPolicy, SkipReason, TopStoriesRefresher};
pub use stats_cache::{SemiFreshStats, StatsPolicy, StatsRefresh};
pub use storage::{KvStore, MemoryKvStore, RedbKvStore, StoryStore, MAX_DATA_TTL};
pub use tasks::BackgroundTasks;
pub use types::*;
