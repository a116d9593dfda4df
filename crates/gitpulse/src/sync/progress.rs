//! Progress reporting types for sync operations.
//!
//! The engine stays silent on stdout; it emits these events through an
//! optional callback and leaves presentation to the caller (the CLI
//! translates them to tracing output or console markers).

use crate::entity::record_kind::RecordKind;

/// Progress events emitted during sync and snapshot operations.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// Started processing a repository.
    RepoStarted {
        /// Full `owner/name` reference.
        repository: String,
    },

    /// Started fetching one record kind for a repository.
    FetchingKind {
        repository: String,
        kind: RecordKind,
    },

    /// Fetched a page of raw items.
    FetchedPage {
        /// Endpoint path the page came from.
        endpoint: String,
        /// Page number (1-indexed).
        page: u32,
        /// Items on this page.
        count: usize,
        /// Running total for this endpoint.
        total_so_far: usize,
    },

    /// Blocking on a rate-limit reset before retrying the same page.
    RateLimitWait {
        endpoint: String,
        /// Seconds the fetch will sleep.
        seconds: u64,
    },

    /// One record kind finished for a repository.
    KindComplete {
        repository: String,
        kind: RecordKind,
        /// Raw items fetched from the API.
        fetched: usize,
        /// Records inserted after dedup.
        inserted: usize,
        /// Candidates dropped as already stored.
        duplicates: usize,
    },

    /// One record kind failed; remaining kinds still run.
    KindFailed {
        repository: String,
        kind: RecordKind,
        error: String,
    },

    /// A repository finished, all kinds attempted.
    RepoComplete {
        repository: String,
        /// Total records inserted across kinds.
        inserted: usize,
    },

    /// A repository failed past the kind level; the batch continues.
    RepoFailed {
        repository: String,
        error: String,
    },

    /// A snapshot document was written.
    SnapshotWritten {
        repository: String,
        path: String,
    },
}

/// Callback for receiving progress events.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit an event if a callback is present.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn emit_without_callback_is_a_noop() {
        emit(
            None,
            SyncProgress::RepoStarted {
                repository: "octo/widgets".to_string(),
            },
        );
    }

    #[test]
    fn emit_invokes_callback() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_capture = Arc::clone(&count);
        let callback: ProgressCallback = Box::new(move |event| {
            count_capture.fetch_add(1, Ordering::SeqCst);
            if let SyncProgress::RepoComplete { inserted, .. } = event {
                assert_eq!(inserted, 7);
            }
        });

        emit(
            Some(&callback),
            SyncProgress::RepoComplete {
                repository: "octo/widgets".to_string(),
                inserted: 7,
            },
        );
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
