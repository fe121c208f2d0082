mod memory;
mod records;
mod redb_storage;
mod traits;

pub use memory::MemoryKvStore;
pub use records::{StoryStore, MAX_DATA_TTL};
pub use redb_storage::{RedbKvStore, CURRENT_SCHEMA_VERSION};
pub use traits::KvStore;
