//! The paginated fetch loop shared by every activity endpoint.
//!
//! Pages of up to [`PER_PAGE`] items are requested starting at page 1 and
//! accumulated until a short page, an empty page, or the caller's item cap.
//! A rate-limited page blocks the caller until the server's reset time and
//! is then retried - the same page, so nothing is lost. Any other failure
//! halts the fetch and returns what was accumulated so far.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::error::ApiError;
use super::types::Endpoint;
use crate::sync::progress::{emit, ProgressCallback, SyncProgress};

/// Page size requested from the API (the server-side maximum).
pub const PER_PAGE: usize = 100;

/// Outcome of fetching one page.
#[derive(Debug, Clone)]
pub enum PageFetch {
    /// A successful page of raw items.
    Items(Vec<Value>),
    /// HTTP 403 with a rate-limit reset time (unix epoch seconds).
    RateLimited { reset_epoch: i64 },
    /// Any other non-200 status. Terminates the fetch for this endpoint.
    Failed { status: u16 },
}

/// Low-level page access, implemented by [`super::GitHubClient`] and by
/// in-memory fakes in tests.
#[async_trait::async_trait]
pub trait ActivityApi: Send + Sync {
    /// Fetch one page of the endpoint. `page` is 1-indexed; `since` is the
    /// server-side lower bound, omitted when `None`.
    async fn fetch_page(
        &self,
        endpoint: &Endpoint,
        page: u32,
        since: Option<DateTime<Utc>>,
    ) -> Result<PageFetch, ApiError>;
}

/// Fetch every page of an endpoint into one accumulator.
///
/// Termination: a page shorter than [`PER_PAGE`], an empty page, or the
/// accumulator reaching `cap` (the result is truncated to exactly `cap`).
/// Rate limits block and retry the same page; other failures (bad status,
/// transport error) are logged and return the partial accumulator.
pub async fn fetch_paginated<A: ActivityApi + ?Sized>(
    api: &A,
    endpoint: &Endpoint,
    since: Option<DateTime<Utc>>,
    cap: Option<usize>,
    on_progress: Option<&ProgressCallback>,
) -> Vec<Value> {
    let mut items: Vec<Value> = Vec::new();
    let mut page = 1u32;

    loop {
        let fetched = match api.fetch_page(endpoint, page, since).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!(endpoint = %endpoint, page, error = %e, "Fetch failed, keeping partial results");
                break;
            }
        };

        match fetched {
            PageFetch::RateLimited { reset_epoch } => {
                let wait = (reset_epoch - Utc::now().timestamp()).max(0) as u64 + 1;
                emit(
                    on_progress,
                    SyncProgress::RateLimitWait {
                        endpoint: endpoint.to_string(),
                        seconds: wait,
                    },
                );
                tracing::warn!(endpoint = %endpoint, page, wait_secs = wait, "Rate limit reached, waiting");
                tokio::time::sleep(std::time::Duration::from_secs(wait)).await;
                // Retry the same page - do not advance.
                continue;
            }
            PageFetch::Failed { status } => {
                tracing::warn!(endpoint = %endpoint, page, status, "Fetch halted, keeping partial results");
                break;
            }
            PageFetch::Items(page_items) => {
                if page_items.is_empty() {
                    break;
                }

                let count = page_items.len();
                items.extend(page_items);

                emit(
                    on_progress,
                    SyncProgress::FetchedPage {
                        endpoint: endpoint.to_string(),
                        page,
                        count,
                        total_so_far: items.len(),
                    },
                );

                if let Some(cap) = cap {
                    if items.len() >= cap {
                        items.truncate(cap);
                        break;
                    }
                }

                if count < PER_PAGE {
                    break;
                }

                page += 1;
            }
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::types::RepoRef;
    use serde_json::json;
    use std::sync::Mutex;

    /// Scripted fake: returns a fixed sequence of page outcomes and records
    /// every (page, since) request it receives.
    struct ScriptedApi {
        script: Mutex<Vec<Result<PageFetch, ApiError>>>,
        requests: Mutex<Vec<u32>>,
    }

    impl ScriptedApi {
        fn new(script: Vec<Result<PageFetch, ApiError>>) -> Self {
            Self {
                script: Mutex::new(script),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requested_pages(&self) -> Vec<u32> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ActivityApi for ScriptedApi {
        async fn fetch_page(
            &self,
            _endpoint: &Endpoint,
            page: u32,
            _since: Option<DateTime<Utc>>,
        ) -> Result<PageFetch, ApiError> {
            self.requests.lock().unwrap().push(page);
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                return Ok(PageFetch::Items(Vec::new()));
            }
            script.remove(0)
        }
    }

    fn page_of(n: usize) -> PageFetch {
        PageFetch::Items((0..n).map(|i| json!({ "i": i })).collect())
    }

    fn endpoint() -> Endpoint {
        Endpoint::commits(&RepoRef::parse("octo/widgets").unwrap())
    }

    #[tokio::test]
    async fn accumulates_until_short_page() {
        let api = ScriptedApi::new(vec![Ok(page_of(100)), Ok(page_of(100)), Ok(page_of(37))]);

        let items = fetch_paginated(&api, &endpoint(), None, None, None).await;

        assert_eq!(items.len(), 237);
        assert_eq!(api.requested_pages(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn stops_on_empty_page() {
        let api = ScriptedApi::new(vec![Ok(page_of(100)), Ok(page_of(0))]);

        let items = fetch_paginated(&api, &endpoint(), None, None, None).await;

        assert_eq!(items.len(), 100);
        assert_eq!(api.requested_pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn single_short_page_needs_one_request() {
        let api = ScriptedApi::new(vec![Ok(page_of(5))]);

        let items = fetch_paginated(&api, &endpoint(), None, None, None).await;

        assert_eq!(items.len(), 5);
        assert_eq!(api.requested_pages(), vec![1]);
    }

    #[tokio::test]
    async fn cap_truncates_and_stops_fetching() {
        let api = ScriptedApi::new(vec![Ok(page_of(100)), Ok(page_of(100)), Ok(page_of(100))]);

        let items = fetch_paginated(&api, &endpoint(), None, Some(150), None).await;

        assert_eq!(items.len(), 150);
        assert_eq!(api.requested_pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn failed_status_returns_partial_results() {
        let api = ScriptedApi::new(vec![
            Ok(page_of(100)),
            Ok(PageFetch::Failed { status: 422 }),
        ]);

        let items = fetch_paginated(&api, &endpoint(), None, None, None).await;

        assert_eq!(items.len(), 100);
        assert_eq!(api.requested_pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn first_page_failure_returns_empty() {
        let api = ScriptedApi::new(vec![Ok(PageFetch::Failed { status: 500 })]);

        let items = fetch_paginated(&api, &endpoint(), None, None, None).await;

        assert!(items.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_sleeps_until_reset_then_retries_same_page() {
        let reset_epoch = Utc::now().timestamp() + 5;
        let api = ScriptedApi::new(vec![
            Ok(PageFetch::RateLimited { reset_epoch }),
            Ok(page_of(3)),
        ]);

        let start = tokio::time::Instant::now();
        let items = fetch_paginated(&api, &endpoint(), None, None, None).await;
        let elapsed = start.elapsed();

        assert_eq!(items.len(), 3);
        // The same page is requested again after the wait.
        assert_eq!(api.requested_pages(), vec![1, 1]);
        // wait = max(reset - now, 0) + 1, so between 5 and 7 seconds.
        assert!(elapsed >= std::time::Duration::from_secs(5), "{elapsed:?}");
        assert!(elapsed < std::time::Duration::from_secs(7), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn stale_rate_limit_reset_waits_one_second() {
        let reset_epoch = Utc::now().timestamp() - 30;
        let api = ScriptedApi::new(vec![
            Ok(PageFetch::RateLimited { reset_epoch }),
            Ok(page_of(1)),
        ]);

        let start = tokio::time::Instant::now();
        let items = fetch_paginated(&api, &endpoint(), None, None, None).await;
        let elapsed = start.elapsed();

        assert_eq!(items.len(), 1);
        assert!(elapsed >= std::time::Duration::from_secs(1), "{elapsed:?}");
        assert!(elapsed < std::time::Duration::from_secs(2), "{elapsed:?}");
    }
}
