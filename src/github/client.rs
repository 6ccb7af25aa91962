// GitHub API HTTP client.
// Builds endpoint URLs, tracks rate limits and maps error responses onto the failure taxonomy.

use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, SearchError};

use super::transport::{HttpResponse, ReqwestTransport, Transport};
use super::types::{ApiErrorBody, RateLimit};

/// GitHub API client with rate limit tracking.
pub struct GitHubClient {
    transport: Arc<dyn Transport>,
    base_url: Url,
    rate_limit: Mutex<RateLimit>,
}

impl GitHubClient {
    /// Create a client talking to `api_url` through `transport`.
    pub fn new(transport: Arc<dyn Transport>, api_url: &str) -> Result<Self> {
        let base_url = Url::parse(api_url)
            .map_err(|e| SearchError::Config(format!("invalid API URL {}: {}", api_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SearchError::Config(format!(
                "API URL cannot be a base: {}",
                api_url
            )));
        }

        Ok(Self {
            transport,
            base_url,
            rate_limit: Mutex::new(RateLimit::default()),
        })
    }

    /// Create a reqwest-backed client from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(config.token.as_deref())?;
        Self::new(Arc::new(transport), &config.api_url)
    }

    /// Rate limit reported by the most recent response carrying the headers.
    pub fn rate_limit(&self) -> RateLimit {
        self.rate_limit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Build an endpoint URL; path segments are percent-encoded.
    pub fn endpoint_url(&self, segments: &[&str], params: &[(&str, String)]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SearchError::Config(format!("API URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                query.append_pair(name, value);
            }
        }

        Ok(url)
    }

    /// GET `url` and decode a successful JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "GET");
        let response = self.transport.get(&url).await?;

        self.update_rate_limit(&response);
        let response = self.check_response(response)?;

        Ok(serde_json::from_str(&response.body)?)
    }

    /// Update rate limit from response headers.
    fn update_rate_limit(&self, response: &HttpResponse) {
        let mut rate_limit = self.rate_limit.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(limit) = response.header_u64("x-ratelimit-limit") {
            rate_limit.limit = limit;
        }
        if let Some(remaining) = response.header_u64("x-ratelimit-remaining") {
            rate_limit.remaining = remaining;
        }
        if let Some(reset) = response.header_u64("x-ratelimit-reset") {
            rate_limit.reset = reset;
        }
    }

    /// Check response status and convert errors.
    fn check_response(&self, response: HttpResponse) -> Result<HttpResponse> {
        if response.is_success() {
            return Ok(response);
        }

        let status = response.status;
        let message = match serde_json::from_str::<ApiErrorBody>(&response.body) {
            Ok(body) if !body.message.is_empty() => body.message,
            Ok(_) => format!("Request failed with status {}", status),
            Err(_) => format!("HTTP {}: {}", status, response.status_text),
        };

        let rate_limited = match status {
            429 => true,
            // GitHub answers 403 for both permission and rate-limit failures
            403 => {
                message.to_ascii_lowercase().contains("rate limit")
                    || response.header_u64("x-ratelimit-remaining") == Some(0)
            }
            _ => false,
        };

        if rate_limited {
            let reset_at = response
                .header_u64("x-ratelimit-reset")
                .and_then(|reset| chrono::DateTime::from_timestamp(reset as i64, 0));
            return Err(SearchError::RateLimited { reset_at });
        }

        Err(SearchError::Http { status, message })
    }
}
