use crate::config::Config;
use crate::http::AppState;
use std::sync::Arc;
use std::time::Instant;
use topstories_core::{
    BackgroundTasks, Clock, HnApi, KvStore, MemoryKvStore, RedbKvStore, RefreshPolicy,
    SemiFreshStats, StatsPolicy, StoryStore, TopStoriesReader, TopStoriesRefresher,
};
use tracing::info;

/// The store backend chosen at startup.
pub enum DataStore {
    Redb(RedbKvStore),
    Memory(MemoryKvStore),
}

impl DataStore {
    pub fn open(config: &Config, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        if config.in_memory {
            info!("Using in-memory store; state is lost on exit");
            return Ok(Self::Memory(MemoryKvStore::with_clock(clock)));
        }
        let path = config.db_path();
        info!("Opening database at {:?}", path);
        Ok(Self::Redb(RedbKvStore::open_with_clock(path, clock)?))
    }
}

impl KvStore for DataStore {
    fn get(&self, key: &str) -> topstories_core::Result<Option<String>> {
        match self {
            Self::Redb(s) => s.get(key),
            Self::Memory(s) => s.get(key),
        }
    }

    fn put(
        &self,
        key: &str,
        value: &str,
        ttl: Option<std::time::Duration>,
    ) -> topstories_core::Result<()> {
        match self {
            Self::Redb(s) => s.put(key, value, ttl),
            Self::Memory(s) => s.put(key, value, ttl),
        }
    }

    fn delete(&self, key: &str) -> topstories_core::Result<()> {
        match self {
            Self::Redb(s) => s.delete(key),
            Self::Memory(s) => s.delete(key),
        }
    }

    fn purge_expired(&self) -> topstories_core::Result<usize> {
        match self {
            Self::Redb(s) => s.purge_expired(),
            Self::Memory(s) => s.purge_expired(),
        }
    }
}

/// Concrete reader/refresher types shared by the HTTP handlers and loops.
pub type Reader<H> = TopStoriesReader<DataStore, H>;
pub type Refresher<H> = TopStoriesRefresher<DataStore, H>;

/// Everything wired together over one store and one upstream client.
pub struct Services<H: HnApi + 'static> {
    pub kv: Arc<DataStore>,
    pub reader: Arc<Reader<H>>,
    pub refresher: Arc<Refresher<H>>,
    pub tasks: BackgroundTasks,
}

impl<H: HnApi + 'static> Services<H> {
    pub fn new(kv: Arc<DataStore>, hn: Arc<H>, clock: Arc<dyn Clock>) -> Self {
        let store = StoryStore::new(kv.clone());
        let tasks = BackgroundTasks::new();

        let stats = SemiFreshStats::new(
            store.clone(),
            hn.clone(),
            clock.clone(),
            StatsPolicy::default(),
        );
        let reader = Arc::new(TopStoriesReader::new(store.clone(), stats, tasks.clone()));
        let refresher = Arc::new(TopStoriesRefresher::new(
            store,
            hn,
            clock,
            RefreshPolicy::default(),
        ));

        Self {
            kv,
            reader,
            refresher,
            tasks,
        }
    }

    pub fn app_state(&self) -> AppState<H> {
        AppState {
            reader: self.reader.clone(),
            refresher: self.refresher.clone(),
            start_time: Instant::now(),
        }
    }
}
