// Error types for ghsearch.
// Classifies GitHub API failures for retry and display decisions, plus storage-layer errors.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Message shown for every rate-limit failure, whatever the upstream wording.
pub const RATE_LIMIT_MESSAGE: &str = "GitHub API rate limit exceeded. Please try again later.";

/// Failure classification driving retry and display decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller fault; the input has to change.
    Permanent,
    /// Infrastructure hiccup; safe to retry.
    Transient,
    /// Caller must wait before trying again.
    RateLimit,
    /// Superseded by newer work; not an error for the user.
    Cancelled,
    /// Unclassified, usually a network-layer failure; retried.
    Unknown,
}

#[derive(Error, Debug, Clone)]
pub enum SearchError {
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("{}", RATE_LIMIT_MESSAGE)]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    #[error("Search cancelled")]
    Cancelled,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response from GitHub: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SearchError {
    /// HTTP status associated with the failure, when there is one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SearchError::Http { status, .. } => Some(*status),
            SearchError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::Http { status, .. } => classify_status(*status),
            SearchError::RateLimited { .. } => ErrorKind::RateLimit,
            SearchError::Cancelled => ErrorKind::Cancelled,
            SearchError::Config(_) => ErrorKind::Permanent,
            SearchError::Network(_) | SearchError::Decode(_) => ErrorKind::Unknown,
        }
    }

    /// Whether the retry policy may attempt the operation again.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transient | ErrorKind::Unknown)
    }

    /// Cancelled operations are ignored by the UI; everything else is shown.
    pub fn is_user_visible(&self) -> bool {
        self.kind() != ErrorKind::Cancelled
    }
}

/// Map an HTTP status code onto the failure taxonomy.
pub fn classify_status(status: u16) -> ErrorKind {
    match status {
        400 | 401 | 403 | 404 | 422 => ErrorKind::Permanent,
        408 | 500 | 502 | 503 | 504 => ErrorKind::Transient,
        429 => ErrorKind::RateLimit,
        _ => ErrorKind::Unknown,
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SearchError::Decode(err.to_string())
        } else {
            SearchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// Failures of the persistent key-value storage. Never escapes the cache layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
