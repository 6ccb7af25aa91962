// Request coordinator.
// Single entry point for user searches and repository listings: cache first, then
// retried HTTP calls, with at most one user search in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::cache::{CacheStore, Storage};
use crate::config::Config;
use crate::error::{Result, SearchError};
use crate::github::{GitHubClient, Repository, UserSearchResponse};
use crate::retry::RetryPolicy;

/// The search currently allowed to publish its result.
struct InFlight {
    id: u64,
    cancel: watch::Sender<bool>,
}

/// Receiving side of a search's cancellation flag.
struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Resolves once the search has been superseded or aborted.
    async fn cancelled(&mut self) {
        let closed = self.rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            // Sender gone without cancelling: never fires
            std::future::pending::<()>().await;
        }
    }
}

pub struct RequestCoordinator {
    client: GitHubClient,
    cache: CacheStore,
    retry: RetryPolicy,
    cache_ttl: Duration,
    in_flight: Mutex<Option<InFlight>>,
    next_search_id: AtomicU64,
}

impl RequestCoordinator {
    pub fn new(client: GitHubClient, cache: CacheStore, retry: RetryPolicy) -> Self {
        Self {
            client,
            cache,
            retry,
            cache_ttl: crate::cache::DEFAULT_TTL,
            in_flight: Mutex::new(None),
            next_search_id: AtomicU64::new(1),
        }
    }

    /// Wire a reqwest-backed coordinator over `storage` from validated configuration.
    pub fn from_config(config: &Config, storage: Arc<dyn Storage>) -> Result<Self> {
        config.validate()?;

        let client = GitHubClient::from_config(config)?;
        let cache = CacheStore::new(storage, config.cache.max_entries);
        let retry = RetryPolicy::from(&config.retry);

        Ok(Self::new(client, cache, retry).with_cache_ttl(config.cache.ttl))
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn client(&self) -> &GitHubClient {
        &self.client
    }

    /// Search users, superseding any search still in flight.
    ///
    /// A superseded search resolves to `SearchError::Cancelled`, which callers
    /// should ignore rather than display.
    pub async fn search_users(&self, query: &str, per_page: u32) -> Result<UserSearchResponse> {
        let (id, mut signal) = self.begin_search();

        let key = format!("users:{}:{}", query, per_page);
        if let Some(cached) = self.cache.get::<UserSearchResponse>(&key) {
            if !self.finish_search(id) {
                debug!(query, "Discarding superseded cached search");
                return Err(SearchError::Cancelled);
            }
            debug!(query, per_page, "Returning cached user search results");
            return Ok(cached);
        }

        info!(query, per_page, "Searching GitHub users");

        let fetch = self.retry.run(|| self.client.search_users(query, per_page));
        let result = tokio::select! {
            biased;
            _ = signal.cancelled() => Err(SearchError::Cancelled),
            result = fetch => result,
        };

        // A newer search owns the result slot now
        if !self.finish_search(id) {
            debug!(query, "Discarding superseded search");
            return Err(SearchError::Cancelled);
        }

        let response = result?;
        self.cache.set(&key, &response, self.cache_ttl);
        Ok(response)
    }

    /// List one page of a user's repositories. Concurrent listings are independent.
    pub async fn get_user_repositories(
        &self,
        username: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Repository>> {
        let key = format!("repos:{}:{}:{}", username, page, per_page);
        if let Some(cached) = self.cache.get::<Vec<Repository>>(&key) {
            debug!(username, page, per_page, "Returning cached repositories");
            return Ok(cached);
        }

        info!(username, page, per_page, "Fetching user repositories");

        let repos = self
            .retry
            .run(|| self.client.get_user_repos(username, page, per_page))
            .await?;

        self.cache.set(&key, &repos, self.cache_ttl);
        Ok(repos)
    }

    /// Abort the in-flight search, if any.
    pub fn cancel_search(&self) {
        if let Some(previous) = self.lock_in_flight().take() {
            debug!(search = previous.id, "Cancelling search");
            previous.cancel.send_replace(true);
        }
    }

    pub fn has_search_in_flight(&self) -> bool {
        self.lock_in_flight().is_some()
    }

    /// Register a new search as current, cancelling the one it replaces.
    fn begin_search(&self) -> (u64, CancelSignal) {
        let id = self.next_search_id.fetch_add(1, Ordering::Relaxed);
        let (cancel, rx) = watch::channel(false);

        let previous = self.lock_in_flight().replace(InFlight { id, cancel });
        if let Some(previous) = previous {
            debug!(search = previous.id, superseded_by = id, "Superseding search");
            previous.cancel.send_replace(true);
        }

        (id, CancelSignal { rx })
    }

    /// Clear the slot if `id` still holds it. Returns whether it did.
    fn finish_search(&self, id: u64) -> bool {
        let mut in_flight = self.lock_in_flight();
        match in_flight.as_ref() {
            Some(current) if current.id == id => {
                *in_flight = None;
                true
            }
            _ => false,
        }
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
