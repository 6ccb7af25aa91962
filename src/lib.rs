// ghsearch library.
// GitHub user and repository search with a bounded local cache, classified
// retries and latest-wins request coordination.

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod github;
pub mod history;
pub mod logging;
pub mod pager;
pub mod query;
pub mod retry;

pub use config::Config;
pub use coordinator::RequestCoordinator;
pub use error::{ErrorKind, Result, SearchError};
pub use retry::{RetryPolicy, with_retry};
