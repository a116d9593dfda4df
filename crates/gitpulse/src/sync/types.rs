//! Shared sync types and constants.

use chrono::{DateTime, Utc};

use crate::entity::record_kind::RecordKind;

/// Retry attempts for a single activity insert batch.
pub const INSERT_RETRY_ATTEMPTS: usize = 3;

/// Initial backoff in milliseconds between insert retries.
pub const INSERT_RETRY_BACKOFF_MS: u64 = 100;

/// Sync strategy.
///
/// The three modes cover the historical script variants: a date-bounded
/// full rewrite, a plain watermark sync, and the default watermark sync
/// with natural-key deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Delete stored activity in the [since, until] window, then refetch
    /// it. No watermarks, no dedup.
    FullRange,
    /// Fetch from the per-kind watermark; insert everything fetched.
    Incremental,
    /// Fetch from the per-kind watermark; drop candidates whose natural
    /// key is already stored.
    #[default]
    IncrementalDedupe,
}

/// Options for a sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Sync strategy.
    pub mode: SyncMode,
    /// Lower bound for full-range mode (server-side `since` filter and
    /// delete bound). Ignored by the incremental modes, which resolve
    /// their own watermark.
    pub since: Option<DateTime<Utc>>,
    /// Upper bound, applied client-side during normalization and as the
    /// full-range delete bound.
    pub until: Option<DateTime<Utc>>,
    /// Maximum items to fetch per endpoint.
    pub cap: Option<usize>,
    /// Maximum number of pull requests to expand reviews for.
    /// `None` expands the full fetched set.
    pub max_review_prs: Option<usize>,
}

/// Outcome of syncing one record kind for one repository.
#[derive(Debug, Clone)]
pub struct KindReport {
    pub kind: RecordKind,
    /// Raw items fetched from the API.
    pub fetched: usize,
    /// Records inserted after dedup.
    pub inserted: usize,
    /// Candidates dropped as already stored.
    pub duplicates: usize,
    /// Error that halted this kind, if any.
    pub error: Option<String>,
}

impl KindReport {
    /// A report for a kind that failed before persisting anything.
    pub fn failed(kind: RecordKind, error: String) -> Self {
        Self {
            kind,
            fetched: 0,
            inserted: 0,
            duplicates: 0,
            error: Some(error),
        }
    }
}

/// Outcome of syncing one repository.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Full `owner/name` reference.
    pub repository: String,
    /// Per-kind outcomes, in sync order.
    pub kinds: Vec<KindReport>,
    /// Error that aborted the repository, if any. Kind-level failures live
    /// in `kinds`, not here.
    pub error: Option<String>,
}

impl SyncReport {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            kinds: Vec::with_capacity(RecordKind::ALL.len()),
            error: None,
        }
    }

    /// A report for a repository that failed at the repository boundary.
    pub fn failed(repository: impl Into<String>, error: String) -> Self {
        Self {
            repository: repository.into(),
            kinds: Vec::new(),
            error: Some(error),
        }
    }

    /// Total records inserted across kinds.
    pub fn total_inserted(&self) -> usize {
        self.kinds.iter().map(|k| k.inserted).sum()
    }

    /// Whether the repository completed without repository-level failure.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}
