//! Progress reporting: console markers on a TTY, tracing otherwise.

use gitpulse::sync::{ProgressCallback, SyncProgress};

/// Build the progress callback for a run.
pub(crate) fn make_callback(is_tty: bool) -> ProgressCallback {
    if is_tty {
        Box::new(handle_tty)
    } else {
        Box::new(handle_logging)
    }
}

/// Console reporter for interactive runs.
fn handle_tty(event: SyncProgress) {
    match event {
        SyncProgress::RepoStarted { repository } => {
            println!("Processing {}...", repository);
        }
        SyncProgress::FetchingKind { kind, .. } => {
            println!("Fetching {}...", kind);
        }
        SyncProgress::RateLimitWait { seconds, .. } => {
            println!("Rate limit reached. Waiting {} seconds...", seconds);
        }
        SyncProgress::KindComplete { kind, inserted, duplicates, .. } => {
            if duplicates > 0 {
                println!("Stored {} {} ({} duplicates skipped)", inserted, kind, duplicates);
            } else {
                println!("Stored {} {}", inserted, kind);
            }
        }
        SyncProgress::KindFailed { kind, error, .. } => {
            eprintln!("Error fetching {}: {}", kind, error);
        }
        SyncProgress::RepoComplete { repository, .. } => {
            println!("\u{2705} Successfully processed {}", repository);
        }
        SyncProgress::RepoFailed { repository, error } => {
            eprintln!("\u{274c} Error processing {}: {}", repository, error);
        }
        SyncProgress::SnapshotWritten { repository, path } => {
            println!("Wrote snapshot for {} to {}", repository, path);
        }
        _ => {}
    }
}

/// Logging reporter using tracing for structured output.
fn handle_logging(event: SyncProgress) {
    match event {
        SyncProgress::RepoStarted { repository } => {
            tracing::info!(repository = %repository, "Processing repository");
        }
        SyncProgress::FetchingKind { repository, kind } => {
            tracing::debug!(repository = %repository, kind = %kind, "Fetching");
        }
        SyncProgress::FetchedPage { endpoint, page, count, total_so_far } => {
            tracing::debug!(endpoint = %endpoint, page, count, total_so_far, "Fetched page");
        }
        SyncProgress::RateLimitWait { endpoint, seconds } => {
            tracing::warn!(endpoint = %endpoint, wait_secs = seconds, "Rate limited, waiting");
        }
        SyncProgress::KindComplete { repository, kind, fetched, inserted, duplicates } => {
            tracing::info!(
                repository = %repository,
                kind = %kind,
                fetched,
                inserted,
                duplicates,
                "Kind complete"
            );
        }
        SyncProgress::KindFailed { repository, kind, error } => {
            tracing::warn!(repository = %repository, kind = %kind, error = %error, "Kind failed");
        }
        SyncProgress::RepoComplete { repository, inserted } => {
            tracing::info!(repository = %repository, inserted, "Repository processed");
        }
        SyncProgress::RepoFailed { repository, error } => {
            tracing::error!(repository = %repository, error = %error, "Repository failed");
        }
        SyncProgress::SnapshotWritten { repository, path } => {
            tracing::info!(repository = %repository, path = %path, "Snapshot written");
        }
        _ => {}
    }
}
