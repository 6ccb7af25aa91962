// Scripted transport for tests.
// Answers requests from per-route response queues and records every URL requested.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use crate::error::{Result, SearchError};

use super::transport::{HttpResponse, Transport};

#[derive(Clone)]
enum Reply {
    Response(HttpResponse),
    NetworkError(String),
}

struct Route {
    /// Matched against the URL path and query.
    needle: String,
    replies: VecDeque<Reply>,
    delay: Duration,
}

/// Each route replays its queued replies in order and repeats the last one.
/// Unmatched requests get a 404.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(&self, needle: &str, reply: Reply) {
        let mut routes = self.routes.lock().unwrap();
        match routes.iter_mut().find(|route| route.needle == needle) {
            Some(route) => route.replies.push_back(reply),
            None => routes.push(Route {
                needle: needle.to_string(),
                replies: VecDeque::from([reply]),
                delay: Duration::ZERO,
            }),
        }
    }

    pub(crate) fn respond(&self, needle: &str, status: u16, body: impl Into<String>) {
        self.push(needle, Reply::Response(HttpResponse::new(status, body)));
    }

    pub(crate) fn respond_with(&self, needle: &str, response: HttpResponse) {
        self.push(needle, Reply::Response(response));
    }

    pub(crate) fn fail(&self, needle: &str, message: &str) {
        self.push(needle, Reply::NetworkError(message.to_string()));
    }

    /// Hold replies on `needle` for `delay` before answering.
    pub(crate) fn delay(&self, needle: &str, delay: Duration) {
        let mut routes = self.routes.lock().unwrap();
        if let Some(route) = routes.iter_mut().find(|route| route.needle == needle) {
            route.delay = delay;
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_reply(&self, target: &str) -> (Option<Reply>, Duration) {
        let mut routes = self.routes.lock().unwrap();
        match routes.iter_mut().find(|route| target.contains(&route.needle)) {
            Some(route) => {
                let reply = if route.replies.len() > 1 {
                    route.replies.pop_front()
                } else {
                    route.replies.front().cloned()
                };
                (reply, route.delay)
            }
            None => (None, Duration::ZERO),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        let target = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        self.calls.lock().unwrap().push(target.clone());

        let (reply, delay) = self.next_reply(&target);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::NetworkError(message)) => Err(SearchError::Network(message)),
            None => Ok(HttpResponse::new(404, r#"{"message": "Not Found"}"#)),
        }
    }
}

/// JSON body of a user search returning `logins`.
pub(crate) fn users_body(logins: &[&str]) -> String {
    let items: Vec<serde_json::Value> = logins
        .iter()
        .enumerate()
        .map(|(i, login)| {
            serde_json::json!({
                "id": i as u64 + 1,
                "login": login,
                "type": "User",
                "html_url": format!("https://github.com/{}", login),
            })
        })
        .collect();

    serde_json::json!({
        "total_count": logins.len(),
        "incomplete_results": false,
        "items": items,
    })
    .to_string()
}

/// JSON body of a repository page with `names`.
pub(crate) fn repos_body(owner: &str, names: &[&str]) -> String {
    let repos: Vec<serde_json::Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            serde_json::json!({
                "id": i as u64 + 1,
                "name": name,
                "full_name": format!("{}/{}", owner, name),
                "description": null,
                "stargazers_count": i,
            })
        })
        .collect();

    serde_json::Value::Array(repos).to_string()
}
