// Cache path utilities.
// Locates the on-disk storage document used by the persistent key-value store.

use std::path::PathBuf;

use directories::ProjectDirs;

/// File name of the persisted storage document.
pub const STORAGE_FILE: &str = "storage.json";

/// Get the base cache directory (~/.cache/ghsearch on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ghsearch").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Default path of the persisted storage document.
pub fn storage_path() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join(STORAGE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_path() {
        // Path construction only, nothing touches the filesystem
        if let Some(path) = storage_path() {
            assert!(path.ends_with("storage.json"));
            assert!(path.to_string_lossy().contains("ghsearch"));
        }
    }
}
