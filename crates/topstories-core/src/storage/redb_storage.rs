use crate::clock::{Clock, SystemClock};
use crate::error::{Result, TopStoriesError};
use crate::storage::traits::KvStore;
use crate::types::EpochSecs;
use redb::{Database, ReadableTable, TableDefinition, TableError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// Table definitions
const KV: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");
const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

/// Current schema version.
/// v1 = bincode envelope `{expires_at, value}` per key
pub const CURRENT_SCHEMA_VERSION: u32 = 1;
const SCHEMA_VERSION_KEY: &str = "schema_version";

/// What is physically stored for every key.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Envelope {
    pub expires_at: Option<EpochSecs>,
    pub value: String,
}

impl Envelope {
    pub fn new(value: &str, ttl: Option<Duration>, now: EpochSecs) -> Self {
        Self {
            expires_at: ttl.map(|ttl| now + ttl.as_secs() as i64),
            value: value.to_string(),
        }
    }

    pub fn is_expired(&self, now: EpochSecs) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(TopStoriesError::from)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(TopStoriesError::from)
    }
}

/// Redb-based key-value store
pub struct RedbKvStore {
    db: Arc<Database>,
    path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl RedbKvStore {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    /// Open with an explicit clock for expiry decisions
    pub fn open_with_clock<P: AsRef<Path>>(path: P, clock: Arc<dyn Clock>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TopStoriesError::Validation(format!("Failed to create directory: {}", e))
            })?;
        }

        let is_new = !path.exists();
        let db = Database::create(&path)?;

        if !is_new {
            Self::check_schema_version(&db)?;
        }

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(KV)?;
            let mut meta = write_txn.open_table(META)?;
            if is_new {
                meta.insert(
                    SCHEMA_VERSION_KEY,
                    CURRENT_SCHEMA_VERSION.to_string().as_bytes(),
                )?;
            }
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            path,
            clock,
        })
    }

    /// Refuse files written with a different schema version.
    fn check_schema_version(db: &Database) -> Result<()> {
        let read_txn = db.begin_read()?;
        let meta = match read_txn.open_table(META) {
            Ok(meta) => meta,
            Err(TableError::TableDoesNotExist(_)) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let stored = meta
            .get(SCHEMA_VERSION_KEY)?
            .map(|v| String::from_utf8_lossy(v.value()).into_owned());

        match stored {
            Some(v) if v != CURRENT_SCHEMA_VERSION.to_string() => {
                Err(TopStoriesError::Validation(format!(
                    "unsupported database schema v{}; this binary reads v{}",
                    v, CURRENT_SCHEMA_VERSION
                )))
            }
            _ => Ok(()),
        }
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KvStore for RedbKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(KV)?;

        let envelope = match table.get(key)? {
            Some(bytes) => Envelope::decode(bytes.value())?,
            None => return Ok(None),
        };

        if envelope.is_expired(self.clock.now()) {
            return Ok(None);
        }
        Ok(Some(envelope.value))
    }

    fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let bytes = Envelope::new(value, ttl, self.clock.now()).encode()?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(KV)?;
            table.insert(key, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(KV)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let write_txn = self.db.begin_write()?;
        let purged = {
            let mut table = write_txn.open_table(KV)?;

            let mut expired = Vec::new();
            for item in table.iter()? {
                let (key, value) = item?;
                // Undecodable entries are left alone; readers report them.
                if let Ok(envelope) = Envelope::decode(value.value()) {
                    if envelope.is_expired(now) {
                        expired.push(key.value().to_string());
                    }
                }
            }

            for key in &expired {
                table.remove(key.as_str())?;
            }
            expired.len()
        };
        write_txn.commit()?;
        Ok(purged)
    }
}
