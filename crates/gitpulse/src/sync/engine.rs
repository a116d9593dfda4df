//! The sync orchestrator.
//!
//! Drives the per-repository, per-kind pipeline: resolve watermark → fetch
//! → normalize → dedupe → persist. Repositories are processed sequentially;
//! a failure in one kind does not abort the remaining kinds, and a failure
//! in one repository does not abort the batch. There is no rollback -
//! partial writes from an aborted repository stay committed, and a re-run
//! converges through deduplication.

use sea_orm::DatabaseConnection;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::entity::record_kind::RecordKind;
use crate::github::{fetch_paginated, ActivityApi, Endpoint, RepoRef};
use crate::normalize::{normalize_batch, NewActivity};
use crate::store::{self, StoreError};
use crate::tracked::TrackedRepo;

use super::dedupe::dedupe;
use super::progress::{emit, ProgressCallback, SyncProgress};
use super::types::{
    KindReport, SyncMode, SyncOptions, SyncReport, INSERT_RETRY_ATTEMPTS, INSERT_RETRY_BACKOFF_MS,
};
use super::watermark;

/// Errors that abort a repository (contained at the repository boundary).
#[derive(Debug, Error)]
pub enum SyncError {
    /// The tracked entry is not an `owner/name` reference.
    #[error("invalid repository reference `{reference}`")]
    InvalidRepo { reference: String },

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Sync every tracked repository, sequentially.
///
/// Never fails as a whole: a repository that errors is reported and
/// logged, and the batch moves on.
pub async fn sync_all<A: ActivityApi + ?Sized>(
    api: &A,
    db: &DatabaseConnection,
    tracked: &[TrackedRepo],
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Vec<SyncReport> {
    let mut reports = Vec::with_capacity(tracked.len());

    for repo in tracked {
        emit(
            on_progress,
            SyncProgress::RepoStarted {
                repository: repo.name.clone(),
            },
        );

        match sync_repo(api, db, &repo.name, options, on_progress).await {
            Ok(report) => {
                tracing::info!(
                    repository = %repo.name,
                    inserted = report.total_inserted(),
                    "Repository synced"
                );
                emit(
                    on_progress,
                    SyncProgress::RepoComplete {
                        repository: repo.name.clone(),
                        inserted: report.total_inserted(),
                    },
                );
                reports.push(report);
            }
            Err(e) => {
                tracing::error!(repository = %repo.name, error = %e, "Repository sync failed");
                emit(
                    on_progress,
                    SyncProgress::RepoFailed {
                        repository: repo.name.clone(),
                        error: e.to_string(),
                    },
                );
                reports.push(SyncReport::failed(&repo.name, e.to_string()));
            }
        }
    }

    reports
}

/// Sync one repository: all four kinds, reviews expanded per pull request.
#[tracing::instrument(skip(api, db, options, on_progress))]
pub async fn sync_repo<A: ActivityApi + ?Sized>(
    api: &A,
    db: &DatabaseConnection,
    reference: &str,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<SyncReport, SyncError> {
    let repo_ref = RepoRef::parse(reference).ok_or_else(|| SyncError::InvalidRepo {
        reference: reference.to_string(),
    })?;

    let repo = store::repos::get_or_create(db, reference).await?;

    if options.mode == SyncMode::FullRange {
        let deleted =
            store::activity::delete_range(db, repo.id, options.since, options.until).await?;
        tracing::info!(repository = %reference, deleted, "Cleared stored window for full-range sync");
    }

    let mut report = SyncReport::new(reference);

    let (commits, _) = sync_listed_kind(
        api,
        db,
        &repo_ref,
        repo.id,
        RecordKind::Commit,
        options,
        on_progress,
    )
    .await;
    report.kinds.push(commits);

    // Raw pull request items are kept: the review step needs their numbers.
    let (pulls, raw_pulls) = sync_listed_kind(
        api,
        db,
        &repo_ref,
        repo.id,
        RecordKind::PullRequest,
        options,
        on_progress,
    )
    .await;
    report.kinds.push(pulls);

    let (issues, _) = sync_listed_kind(
        api,
        db,
        &repo_ref,
        repo.id,
        RecordKind::Issue,
        options,
        on_progress,
    )
    .await;
    report.kinds.push(issues);

    let reviews = sync_reviews(api, db, &repo_ref, repo.id, &raw_pulls, options, on_progress).await;
    report.kinds.push(reviews);

    Ok(report)
}

/// Sync one listed kind (commits, pull requests, or issues), containing
/// failures at the kind boundary. Returns the report and the raw items.
async fn sync_listed_kind<A: ActivityApi + ?Sized>(
    api: &A,
    db: &DatabaseConnection,
    repo_ref: &RepoRef,
    repository_id: Uuid,
    kind: RecordKind,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> (KindReport, Vec<Value>) {
    match sync_listed_kind_inner(api, db, repo_ref, repository_id, kind, options, on_progress).await
    {
        Ok(done) => done,
        Err(e) => {
            tracing::warn!(repository = %repo_ref, kind = %kind, error = %e, "Kind sync failed, continuing");
            emit(
                on_progress,
                SyncProgress::KindFailed {
                    repository: repo_ref.full_name(),
                    kind,
                    error: e.to_string(),
                },
            );
            (KindReport::failed(kind, e.to_string()), Vec::new())
        }
    }
}

async fn sync_listed_kind_inner<A: ActivityApi + ?Sized>(
    api: &A,
    db: &DatabaseConnection,
    repo_ref: &RepoRef,
    repository_id: Uuid,
    kind: RecordKind,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<(KindReport, Vec<Value>), SyncError> {
    let endpoint =
        Endpoint::for_kind(kind, repo_ref).expect("listed kinds have a repository endpoint");

    let since = match options.mode {
        SyncMode::FullRange => options.since,
        SyncMode::Incremental | SyncMode::IncrementalDedupe => {
            watermark::resolve(db, repository_id, kind).await?
        }
    };

    emit(
        on_progress,
        SyncProgress::FetchingKind {
            repository: repo_ref.full_name(),
            kind,
        },
    );

    let raw = fetch_paginated(api, &endpoint, since, options.cap, on_progress).await;
    let candidates = normalize_batch(kind, &raw, options.until);

    let report = persist_kind(
        db,
        repo_ref,
        repository_id,
        kind,
        raw.len(),
        candidates,
        options,
        on_progress,
    )
    .await?;

    Ok((report, raw))
}

/// Sync reviews: one paginated fetch per pull request, accumulated across
/// the PR set before deduping. The reviews endpoint has no `since` filter;
/// incrementality for reviews comes from deduplication.
async fn sync_reviews<A: ActivityApi + ?Sized>(
    api: &A,
    db: &DatabaseConnection,
    repo_ref: &RepoRef,
    repository_id: Uuid,
    raw_pulls: &[Value],
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> KindReport {
    let kind = RecordKind::Review;

    emit(
        on_progress,
        SyncProgress::FetchingKind {
            repository: repo_ref.full_name(),
            kind,
        },
    );

    let raw = fetch_reviews_raw(api, repo_ref, raw_pulls, options, on_progress).await;
    let candidates = normalize_batch(kind, &raw, options.until);

    match persist_kind(
        db,
        repo_ref,
        repository_id,
        kind,
        raw.len(),
        candidates,
        options,
        on_progress,
    )
    .await
    {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(repository = %repo_ref, kind = %kind, error = %e, "Kind sync failed, continuing");
            emit(
                on_progress,
                SyncProgress::KindFailed {
                    repository: repo_ref.full_name(),
                    kind,
                    error: e.to_string(),
                },
            );
            KindReport::failed(kind, e.to_string())
        }
    }
}

/// Fetch raw review items for every pull request in the fetched PR set,
/// one paginated fetch per pull request.
pub(crate) async fn fetch_reviews_raw<A: ActivityApi + ?Sized>(
    api: &A,
    repo_ref: &RepoRef,
    raw_pulls: &[Value],
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Vec<Value> {
    let pr_limit = options.max_review_prs.unwrap_or(usize::MAX);
    let mut raw: Vec<Value> = Vec::new();

    for pr in raw_pulls.iter().take(pr_limit) {
        let number = match pr.get("number").and_then(Value::as_u64) {
            Some(n) => n,
            None => {
                tracing::warn!(repository = %repo_ref, "Pull request item without a number, skipping reviews");
                continue;
            }
        };

        let endpoint = Endpoint::pr_reviews(repo_ref, number);
        raw.extend(fetch_paginated(api, &endpoint, None, options.cap, on_progress).await);
    }

    raw
}

/// Dedupe (when the mode asks for it) and insert the surviving candidates.
#[allow(clippy::too_many_arguments)]
async fn persist_kind(
    db: &DatabaseConnection,
    repo_ref: &RepoRef,
    repository_id: Uuid,
    kind: RecordKind,
    fetched: usize,
    candidates: Vec<NewActivity>,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<KindReport, SyncError> {
    let candidate_count = candidates.len();

    let survivors = match options.mode {
        SyncMode::IncrementalDedupe => {
            let existing = store::activity::existing_keys(db, repository_id, kind).await?;
            dedupe(candidates, &existing)
        }
        SyncMode::FullRange | SyncMode::Incremental => candidates,
    };

    let duplicates = candidate_count - survivors.len();
    let inserted = store::activity::insert_many_with_retry(
        db,
        repository_id,
        kind,
        &survivors,
        INSERT_RETRY_ATTEMPTS,
        INSERT_RETRY_BACKOFF_MS,
    )
    .await?;

    tracing::info!(
        repository = %repo_ref,
        kind = %kind,
        fetched,
        inserted,
        duplicates,
        "Stored activity records"
    );
    emit(
        on_progress,
        SyncProgress::KindComplete {
            repository: repo_ref.full_name(),
            kind,
            fetched,
            inserted,
            duplicates,
        },
    );

    Ok(KindReport {
        kind,
        fetched,
        inserted,
        duplicates,
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::PageFetch;
    use chrono::{DateTime, Utc};
    use serde_json::json;

    /// Fake API serving fixed item sets per endpoint path.
    struct FixtureApi {
        routes: std::collections::HashMap<String, Vec<Value>>,
    }

    #[async_trait::async_trait]
    impl ActivityApi for FixtureApi {
        async fn fetch_page(
            &self,
            endpoint: &Endpoint,
            page: u32,
            _since: Option<DateTime<Utc>>,
        ) -> Result<PageFetch, crate::github::ApiError> {
            if page > 1 {
                return Ok(PageFetch::Items(Vec::new()));
            }
            Ok(PageFetch::Items(
                self.routes.get(endpoint.path()).cloned().unwrap_or_default(),
            ))
        }
    }

    #[tokio::test]
    async fn fetch_reviews_raw_expands_each_pull_request() {
        let mut routes = std::collections::HashMap::new();
        routes.insert(
            "/repos/octo/widgets/pulls/1/reviews".to_string(),
            vec![json!({ "body": "r1", "user": { "login": "a" } })],
        );
        routes.insert(
            "/repos/octo/widgets/pulls/2/reviews".to_string(),
            vec![
                json!({ "body": "r2", "user": { "login": "b" } }),
                json!({ "body": "r3", "user": { "login": "c" } }),
            ],
        );
        let api = FixtureApi { routes };
        let repo_ref = RepoRef::parse("octo/widgets").unwrap();
        let raw_pulls = vec![
            json!({ "number": 1 }),
            json!({ "number": 2 }),
            json!({ "no_number": true }),
        ];

        let raw = fetch_reviews_raw(&api, &repo_ref, &raw_pulls, &SyncOptions::default(), None)
            .await;
        assert_eq!(raw.len(), 3);
    }

    #[tokio::test]
    async fn fetch_reviews_raw_honors_pr_limit() {
        let mut routes = std::collections::HashMap::new();
        for n in 1..=3 {
            routes.insert(
                format!("/repos/octo/widgets/pulls/{}/reviews", n),
                vec![json!({ "body": format!("r{}", n), "user": { "login": "a" } })],
            );
        }
        let api = FixtureApi { routes };
        let repo_ref = RepoRef::parse("octo/widgets").unwrap();
        let raw_pulls = vec![
            json!({ "number": 1 }),
            json!({ "number": 2 }),
            json!({ "number": 3 }),
        ];
        let options = SyncOptions {
            max_review_prs: Some(2),
            ..Default::default()
        };

        let raw = fetch_reviews_raw(&api, &repo_ref, &raw_pulls, &options, None).await;
        assert_eq!(raw.len(), 2);
    }

    #[test]
    fn sync_error_display_names_the_reference() {
        let err = SyncError::InvalidRepo {
            reference: "garbage".to_string(),
        };
        assert!(err.to_string().contains("garbage"));
    }
}
