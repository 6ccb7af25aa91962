// Cache module for local persistent caching.
// Stores GitHub API responses behind a bounded, expiring, LRU-evicting store.

pub mod clock;
pub mod paths;
pub mod storage;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use storage::{FileStorage, MemoryStorage, Storage, open_persistent};
pub use store::{CACHE_PREFIX, CacheEntry, CacheStore, DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
