// Search history.
// Recent queries persisted next to the cache, most recent first.

use std::sync::Arc;

use tracing::warn;

use crate::cache::Storage;

/// Storage key of the history list. Deliberately outside the cache prefix so
/// cache sweeps and eviction never touch it.
pub const HISTORY_KEY: &str = "github-search-history";

pub const MAX_HISTORY_SIZE: usize = 10;

pub struct SearchHistory {
    storage: Arc<dyn Storage>,
}

impl SearchHistory {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Stored queries, most recent first. Unreadable history reads as empty.
    pub fn entries(&self) -> Vec<String> {
        let raw = match self.storage.get_item(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "Failed to read search history");
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "Ignoring unreadable search history");
            Vec::new()
        })
    }

    /// Record `query` at the front, dropping case-insensitive duplicates.
    pub fn add(&self, query: &str) {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return;
        }

        let lower = trimmed.to_lowercase();
        let mut entries: Vec<String> = self
            .entries()
            .into_iter()
            .filter(|entry| entry.to_lowercase() != lower)
            .collect();
        entries.insert(0, trimmed.to_string());
        entries.truncate(MAX_HISTORY_SIZE);

        self.save(&entries);
    }

    /// Remove an exact entry.
    pub fn remove(&self, query: &str) {
        let entries: Vec<String> = self
            .entries()
            .into_iter()
            .filter(|entry| entry != query)
            .collect();
        self.save(&entries);
    }

    pub fn clear(&self) {
        if let Err(err) = self.storage.remove_item(HISTORY_KEY) {
            warn!(error = %err, "Failed to clear search history");
        }
    }

    /// Entries containing `filter`, case-insensitively. Blank filters match all.
    pub fn filtered(&self, filter: &str) -> Vec<String> {
        let entries = self.entries();
        if filter.trim().is_empty() {
            return entries;
        }

        let lower = filter.to_lowercase();
        entries
            .into_iter()
            .filter(|entry| entry.to_lowercase().contains(&lower))
            .collect()
    }

    fn save(&self, entries: &[String]) {
        let json = match serde_json::to_string(entries) {
            Ok(json) => json,
            Err(err) => {
                warn!(error = %err, "Failed to serialize search history");
                return;
            }
        };

        if let Err(err) = self.storage.set_item(HISTORY_KEY, &json) {
            warn!(error = %err, "Failed to save search history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, MemoryStorage};
    use std::time::Duration;

    fn history() -> (SearchHistory, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (SearchHistory::new(storage.clone()), storage)
    }

    #[test]
    fn test_add_puts_most_recent_first_without_duplicates() {
        let (history, _) = history();

        history.add("torvalds");
        history.add("microsoft");
        history.add("  Torvalds ");
        history.add("   ");

        assert_eq!(history.entries(), vec!["Torvalds", "microsoft"]);
    }

    #[test]
    fn test_history_is_bounded() {
        let (history, _) = history();
        for i in 0..15 {
            history.add(&format!("user{}", i));
        }

        let entries = history.entries();
        assert_eq!(entries.len(), MAX_HISTORY_SIZE);
        assert_eq!(entries[0], "user14");
        assert_eq!(entries[9], "user5");
    }

    #[test]
    fn test_remove_and_clear() {
        let (history, _) = history();
        history.add("alpha");
        history.add("beta");

        history.remove("alpha");
        assert_eq!(history.entries(), vec!["beta"]);

        history.clear();
        assert!(history.entries().is_empty());
    }

    #[test]
    fn test_filtered() {
        let (history, _) = history();
        history.add("rust-lang");
        history.add("octocat");
        history.add("RustConf");

        assert_eq!(history.filtered("rust"), vec!["RustConf", "rust-lang"]);
        assert_eq!(history.filtered(" ").len(), 3);
    }

    #[test]
    fn test_corrupt_history_reads_empty() {
        let (history, storage) = history();
        storage.set_item(HISTORY_KEY, "{oops").unwrap();

        assert!(history.entries().is_empty());
        history.add("fresh");
        assert_eq!(history.entries(), vec!["fresh"]);
    }

    #[test]
    fn test_survives_cache_clear() {
        let (history, storage) = history();
        let cache = CacheStore::new(storage, 5);

        history.add("kept");
        cache.set("users:kept:5", &1, Duration::from_secs(60));
        cache.clear();

        assert_eq!(history.entries(), vec!["kept"]);
    }
}
