// GitHub API module.
// Provides the client, transport and types for the search and repository endpoints.

pub mod client;
pub mod endpoints;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::GitHubClient;
pub use transport::{HttpResponse, ReqwestTransport, Transport};
pub use types::*;
