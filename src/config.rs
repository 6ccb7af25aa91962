// Static configuration for ghsearch.
// Read once at startup from environment variables, falling back to defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, SearchError};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_millis(300_000),
            max_entries: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub retries: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            min_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaginationConfig {
    pub repos_per_page: u32,
    pub users_per_page: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            repos_per_page: 30,
            users_per_page: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    /// Optional token; requests are unauthenticated without one.
    pub token: Option<String>,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    pub pagination: PaginationConfig,
    /// Overrides the platform cache location of the storage document.
    pub storage_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            cache: CacheConfig::default(),
            retry: RetryConfig::default(),
            pagination: PaginationConfig::default(),
            storage_path: None,
        }
    }
}

impl Config {
    /// Build configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    /// Missing, empty or unparsable values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let number = |key: &str, default: u64| {
            var(key)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        // Values that overflow the target type fall back too
        let count = |key: &str, default: u32| {
            u32::try_from(number(key, u64::from(default))).unwrap_or(default)
        };
        let size = |key: &str, default: usize| {
            usize::try_from(number(key, default as u64)).unwrap_or(default)
        };

        let defaults = Config::default();
        let millis = |d: Duration| u64::try_from(d.as_millis()).unwrap_or(u64::MAX);

        Self {
            api_url: var("GHSEARCH_API_URL").unwrap_or(defaults.api_url),
            token: var("GITHUB_TOKEN"),
            cache: CacheConfig {
                ttl: Duration::from_millis(number(
                    "GHSEARCH_CACHE_TTL_MS",
                    millis(defaults.cache.ttl),
                )),
                max_entries: size("GHSEARCH_CACHE_MAX_ENTRIES", defaults.cache.max_entries),
            },
            retry: RetryConfig {
                retries: count("GHSEARCH_RETRY_COUNT", defaults.retry.retries),
                min_delay: Duration::from_millis(number(
                    "GHSEARCH_RETRY_MIN_TIMEOUT_MS",
                    millis(defaults.retry.min_delay),
                )),
                max_delay: Duration::from_millis(number(
                    "GHSEARCH_RETRY_MAX_TIMEOUT_MS",
                    millis(defaults.retry.max_delay),
                )),
            },
            pagination: PaginationConfig {
                repos_per_page: count(
                    "GHSEARCH_REPOS_PER_PAGE",
                    defaults.pagination.repos_per_page,
                ),
                users_per_page: count(
                    "GHSEARCH_USERS_PER_PAGE",
                    defaults.pagination.users_per_page,
                ),
            },
            storage_path: var("GHSEARCH_STORAGE_PATH").map(PathBuf::from),
        }
    }

    /// Reject values the cache, retry policy or paging cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.cache.max_entries == 0 {
            return Err(SearchError::Config(
                "cache max entries must be at least 1".to_string(),
            ));
        }
        if self.retry.min_delay > self.retry.max_delay {
            return Err(SearchError::Config(format!(
                "retry min delay ({:?}) exceeds max delay ({:?})",
                self.retry.min_delay, self.retry.max_delay
            )));
        }
        if self.pagination.repos_per_page == 0 || self.pagination.users_per_page == 0 {
            return Err(SearchError::Config(
                "page sizes must be at least 1".to_string(),
            ));
        }
        reqwest::Url::parse(&self.api_url)
            .map_err(|e| SearchError::Config(format!("invalid API URL {}: {}", self.api_url, e)))?;
        Ok(())
    }
}
