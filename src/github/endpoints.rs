// GitHub API endpoint functions.
// Typed single-attempt calls for user search and repository listing.

use crate::error::Result;

use super::client::GitHubClient;
use super::types::{Repository, UserSearchResponse};

impl GitHubClient {
    /// Search users matching `query`.
    pub async fn search_users(&self, query: &str, per_page: u32) -> Result<UserSearchResponse> {
        let params = [("q", query.to_string()), ("per_page", per_page.to_string())];
        let url = self.endpoint_url(&["search", "users"], &params)?;
        self.get_json(url).await
    }

    /// Get one page of a user's public repositories, most recently updated first.
    pub async fn get_user_repos(
        &self,
        username: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Repository>> {
        let params = [
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
            ("sort", "updated".to_string()),
        ];
        let url = self.endpoint_url(&["users", username, "repos"], &params)?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::github::testing::{ScriptedTransport, repos_body, users_body};

    #[tokio::test]
    async fn test_search_users_request_shape() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "/search/users",
            200,
            users_body(&["octocat", "octodog"]),
        );
        let client = GitHubClient::new(transport.clone(), "https://api.github.com").unwrap();

        let result = client.search_users("octo", 5).await.unwrap();

        assert_eq!(result.total_count, 2);
        assert_eq!(result.items[1].login, "octodog");
        assert_eq!(transport.calls(), vec!["/search/users?q=octo&per_page=5"]);
    }

    #[tokio::test]
    async fn test_get_user_repos_request_shape() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "/users/octocat/repos",
            200,
            repos_body("octocat", &["hello-world", "spoon-knife"]),
        );
        let client = GitHubClient::new(transport.clone(), "https://api.github.com").unwrap();

        let repos = client.get_user_repos("octocat", 2, 30).await.unwrap();

        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].full_name, "octocat/hello-world");
        assert_eq!(
            transport.calls(),
            vec!["/users/octocat/repos?page=2&per_page=30&sort=updated"]
        );
    }
}
