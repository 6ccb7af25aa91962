// GitHub API response types.
// Defines structs for deserializing user search results, repositories and error payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account type discriminator (user or organization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OwnerType {
    #[default]
    User,
    Organization,
    Bot,
    #[serde(other)]
    Unknown,
}

/// GitHub user or organization as returned by search and repository listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
    #[serde(rename = "type", default)]
    pub owner_type: OwnerType,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub html_url: String,
}

/// Result of `GET /search/users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSearchResponse {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<User>,
}

/// GitHub repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: Option<User>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub fork: bool,
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: String,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
}

/// Error payload of a non-success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    pub documentation_url: Option<String>,
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset: u64,
}

impl RateLimit {
    /// Reset instant, when the reset header has been seen.
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        if self.reset == 0 {
            return None;
        }
        DateTime::from_timestamp(self.reset as i64, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_search_response() {
        let json = r#"{
            "total_count": 2,
            "incomplete_results": false,
            "items": [
                {"id": 1, "login": "octocat", "type": "User", "avatar_url": null, "html_url": "https://github.com/octocat", "score": 1.0},
                {"id": 2, "login": "github", "type": "Organization"}
            ]
        }"#;

        let response: UserSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.total_count, 2);
        assert_eq!(response.items[0].login, "octocat");
        assert_eq!(response.items[1].owner_type, OwnerType::Organization);
        assert_eq!(response.items[1].html_url, "");
    }

    #[test]
    fn test_deserialize_repository_with_sparse_fields() {
        let json = r#"{
            "id": 7,
            "name": "hello-world",
            "full_name": "octocat/hello-world",
            "owner": {"id": 1, "login": "octocat", "type": "Mannequin"},
            "description": null,
            "language": "Rust",
            "stargazers_count": 42,
            "updated_at": "2024-05-01T12:00:00Z"
        }"#;

        let repo: Repository = serde_json::from_str(json).unwrap();
        assert_eq!(repo.owner.unwrap().owner_type, OwnerType::Unknown);
        assert_eq!(repo.stargazers_count, 42);
        assert!(!repo.fork);
        assert!(repo.pushed_at.is_none());
    }

    #[test]
    fn test_rate_limit_reset_at() {
        assert_eq!(RateLimit::default().reset_at(), None);

        let limit = RateLimit {
            limit: 60,
            remaining: 0,
            reset: 1_700_000_000,
        };
        assert_eq!(limit.reset_at().unwrap().timestamp(), 1_700_000_000);
    }
}
