//! GitHub API client.
//!
//! A thin authenticated wrapper over reqwest. The client performs exactly
//! one kind of request - a paged GET returning a JSON array - and reports
//! the status-level outcome as data ([`PageFetch`]) so the pagination loop
//! owns all retry and termination policy.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;

use super::error::ApiError;
use super::pagination::{ActivityApi, PageFetch, PER_PAGE};
use super::types::Endpoint;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Explicit per-request timeout. The sync loop is fully sequential, so a
/// hung request with no timeout would stall the whole batch.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the rate-limit reset time (unix epoch seconds).
const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Authenticated GitHub API client.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    token: Arc<String>,
    api_url: Arc<String>,
}

impl GitHubClient {
    /// Create a client from a personal access token.
    ///
    /// `api_url` overrides the API base (useful for GitHub Enterprise or a
    /// test server); `None` uses [`DEFAULT_API_URL`].
    pub fn new(token: &str, api_url: Option<&str>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let api_url = api_url
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            http,
            token: Arc::new(token.to_string()),
            api_url: Arc::new(api_url),
        })
    }

    /// The configured API base URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// Extract the rate-limit reset epoch from response headers, if present.
fn parse_reset_epoch(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(RATE_LIMIT_RESET_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
}

#[async_trait::async_trait]
impl ActivityApi for GitHubClient {
    async fn fetch_page(
        &self,
        endpoint: &Endpoint,
        page: u32,
        since: Option<DateTime<Utc>>,
    ) -> Result<PageFetch, ApiError> {
        let url = format!("{}{}", self.api_url, endpoint.path());

        let mut request = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "gitpulse")
            .header("Authorization", format!("token {}", self.token.as_str()))
            .query(&[("page", page.to_string()), ("per_page", PER_PAGE.to_string())]);

        if let Some(since) = since {
            request = request.query(&[(
                "since",
                since.to_rfc3339_opts(SecondsFormat::Secs, true),
            )]);
        }

        let response = request.send().await?;
        let status = response.status();

        match status {
            StatusCode::OK => {
                let body = response.bytes().await?;
                let items: Vec<Value> = serde_json::from_slice(&body)?;
                Ok(PageFetch::Items(items))
            }
            StatusCode::FORBIDDEN => {
                // A 403 without a reset header is a genuine permission
                // failure, not a rate limit - halt instead of retrying.
                match parse_reset_epoch(response.headers()) {
                    Some(reset_epoch) => Ok(PageFetch::RateLimited { reset_epoch }),
                    None => Ok(PageFetch::Failed {
                        status: status.as_u16(),
                    }),
                }
            }
            _ => Ok(PageFetch::Failed {
                status: status.as_u16(),
            }),
        }
    }
}
