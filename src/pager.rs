// Repository pager.
// Accumulates a user's repositories page by page through the request coordinator.

use tracing::{debug, error};

use crate::coordinator::RequestCoordinator;
use crate::error::SearchError;
use crate::github::Repository;

/// Infinite-scroll state for one user's repository list.
#[derive(Debug, Clone)]
pub struct RepoPager {
    per_page: u32,
    username: Option<String>,
    items: Vec<Repository>,
    page: u32,
    has_more: bool,
    error: Option<SearchError>,
}

impl RepoPager {
    pub fn new(per_page: u32) -> Self {
        Self {
            per_page: per_page.max(1),
            username: None,
            items: Vec::new(),
            page: 0,
            has_more: true,
            error: None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn items(&self) -> &[Repository] {
        &self.items
    }

    /// Last page loaded, 0 before the first load.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// A full page came back last time, so another may exist.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// The last failed load, with its classification intact.
    pub fn error(&self) -> Option<&SearchError> {
        self.error.as_ref()
    }

    /// Start over with `username`, loading its first page.
    pub async fn load(&mut self, coordinator: &RequestCoordinator, username: &str) {
        if username.is_empty() {
            return;
        }

        self.reset();
        self.username = Some(username.to_string());

        match coordinator
            .get_user_repositories(username, 1, self.per_page)
            .await
        {
            Ok(repos) => {
                debug!(username, count = repos.len(), "Loaded initial repos");
                self.page = 1;
                self.has_more = repos.len() == self.per_page as usize;
                self.items = repos;
            }
            Err(err) => {
                self.has_more = false;
                self.record_error(username, err);
            }
        }
    }

    /// Append the next page. No-op before `load` or once the list is exhausted.
    pub async fn load_more(&mut self, coordinator: &RequestCoordinator) {
        let Some(username) = self.username.clone() else {
            return;
        };
        if !self.has_more {
            return;
        }

        let next_page = self.page + 1;
        match coordinator
            .get_user_repositories(&username, next_page, self.per_page)
            .await
        {
            Ok(mut repos) => {
                debug!(
                    username = %username,
                    page = next_page,
                    count = repos.len(),
                    "Loaded more repos"
                );
                self.page = next_page;
                self.has_more = repos.len() == self.per_page as usize;
                self.items.append(&mut repos);
                self.error = None;
            }
            Err(err) => self.record_error(&username, err),
        }
    }

    /// Keep loading until the list is exhausted, a page fails, or `max_pages` are held.
    pub async fn load_all(&mut self, coordinator: &RequestCoordinator, max_pages: u32) {
        while self.has_more && self.error.is_none() && self.page < max_pages {
            let before = self.page;
            self.load_more(coordinator).await;
            if self.page == before {
                break;
            }
        }
    }

    pub fn reset(&mut self) {
        self.username = None;
        self.items.clear();
        self.page = 0;
        self.has_more = true;
        self.error = None;
    }

    fn record_error(&mut self, username: &str, err: SearchError) {
        if !err.is_user_visible() {
            return;
        }
        error!(username, error = %err, "Failed to load repos");
        self.error = Some(err);
    }
}
