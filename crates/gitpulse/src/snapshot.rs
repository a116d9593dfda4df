//! Static JSON snapshot output - the file-based variant of the sync.
//!
//! Instead of persisting to the store, each tracked repository gets one
//! JSON document `{repository, commits[], pull_requests[], issues[],
//! reviews[]}` written to the output directory, plus a sibling
//! `repos.json` listing every tracked repository name. No watermarks and
//! no dedup apply here - a snapshot is a fresh fetch.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use thiserror::Error;

use crate::entity::record_kind::RecordKind;
use crate::github::{fetch_paginated, ActivityApi, Endpoint, RepoRef};
use crate::normalize::{normalize_batch, NewActivity};
use crate::sync::engine::fetch_reviews_raw;
use crate::sync::progress::{emit, ProgressCallback, SyncProgress};
use crate::sync::types::SyncOptions;

/// Errors that abort a snapshot (contained at the repository boundary,
/// except for output-directory and index failures which are fatal).
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The tracked entry is not an `owner/name` reference.
    #[error("invalid repository reference `{reference}`")]
    InvalidRepo { reference: String },

    /// Filesystem failure writing output.
    #[error("failed to write {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of snapshotting one repository.
#[derive(Debug, Clone)]
pub struct SnapshotReport {
    /// Full `owner/name` reference.
    pub repository: String,
    /// Path the document was written to, when successful.
    pub path: Option<PathBuf>,
    /// Total records across the four kinds.
    pub records: usize,
    /// Error that aborted this repository, if any.
    pub error: Option<String>,
}

/// Write a snapshot document for every tracked repository, plus the
/// `repos.json` index.
///
/// Per-repository failures are reported and do not stop the batch;
/// failures creating the output directory or writing the index are fatal.
pub async fn write_snapshots<A: ActivityApi + ?Sized>(
    api: &A,
    tracked: &[crate::tracked::TrackedRepo],
    options: &SyncOptions,
    out_dir: &Path,
    on_progress: Option<&ProgressCallback>,
) -> Result<Vec<SnapshotReport>, SnapshotError> {
    fs::create_dir_all(out_dir).map_err(|source| SnapshotError::Io {
        path: out_dir.display().to_string(),
        source,
    })?;

    let mut reports = Vec::with_capacity(tracked.len());

    for repo in tracked {
        emit(
            on_progress,
            SyncProgress::RepoStarted {
                repository: repo.name.clone(),
            },
        );

        let path = out_dir.join(repo.snapshot_file_name());
        match snapshot_repo(api, &repo.name, options, &path, on_progress).await {
            Ok(records) => {
                tracing::info!(repository = %repo.name, records, path = %path.display(), "Snapshot written");
                emit(
                    on_progress,
                    SyncProgress::SnapshotWritten {
                        repository: repo.name.clone(),
                        path: path.display().to_string(),
                    },
                );
                reports.push(SnapshotReport {
                    repository: repo.name.clone(),
                    path: Some(path),
                    records,
                    error: None,
                });
            }
            Err(e) => {
                tracing::error!(repository = %repo.name, error = %e, "Snapshot failed");
                emit(
                    on_progress,
                    SyncProgress::RepoFailed {
                        repository: repo.name.clone(),
                        error: e.to_string(),
                    },
                );
                reports.push(SnapshotReport {
                    repository: repo.name.clone(),
                    path: None,
                    records: 0,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    write_index(tracked, out_dir)?;

    Ok(reports)
}

/// Fetch all four kinds for one repository and write its document.
/// Returns the total record count.
async fn snapshot_repo<A: ActivityApi + ?Sized>(
    api: &A,
    reference: &str,
    options: &SyncOptions,
    path: &Path,
    on_progress: Option<&ProgressCallback>,
) -> Result<usize, SnapshotError> {
    let repo_ref = RepoRef::parse(reference).ok_or_else(|| SnapshotError::InvalidRepo {
        reference: reference.to_string(),
    })?;

    let mut sections: Vec<(RecordKind, Vec<NewActivity>)> = Vec::with_capacity(4);
    let mut raw_pulls: Vec<Value> = Vec::new();

    for kind in [RecordKind::Commit, RecordKind::PullRequest, RecordKind::Issue] {
        let endpoint = Endpoint::for_kind(kind, &repo_ref).expect("listed kind");
        emit(
            on_progress,
            SyncProgress::FetchingKind {
                repository: repo_ref.full_name(),
                kind,
            },
        );
        let raw = fetch_paginated(api, &endpoint, options.since, options.cap, on_progress).await;
        let records = normalize_batch(kind, &raw, options.until);
        if kind == RecordKind::PullRequest {
            raw_pulls = raw;
        }
        sections.push((kind, records));
    }

    emit(
        on_progress,
        SyncProgress::FetchingKind {
            repository: repo_ref.full_name(),
            kind: RecordKind::Review,
        },
    );
    let raw_reviews = fetch_reviews_raw(api, &repo_ref, &raw_pulls, options, on_progress).await;
    sections.push((
        RecordKind::Review,
        normalize_batch(RecordKind::Review, &raw_reviews, options.until),
    ));

    let total: usize = sections.iter().map(|(_, records)| records.len()).sum();

    let mut doc = json!({ "repository": reference });
    for (kind, records) in &sections {
        doc[kind.table_name()] = Value::Array(records.iter().map(record_to_json).collect());
    }

    let body = serde_json::to_string_pretty(&doc).expect("snapshot document serializes");
    fs::write(path, body).map_err(|source| SnapshotError::Io {
        path: path.display().to_string(),
        source,
    })?;

    Ok(total)
}

/// Render one record with its kind-specific field names.
fn record_to_json(record: &NewActivity) -> Value {
    let mut map = serde_json::Map::with_capacity(3);
    map.insert(
        record.kind.body_field().to_string(),
        Value::String(record.body.clone()),
    );
    map.insert("author".to_string(), Value::String(record.author.clone()));
    map.insert(
        record.kind.timestamp_field().to_string(),
        Value::String(record.occurred_at.to_rfc3339()),
    );
    Value::Object(map)
}

/// Write `repos.json`: the list of all tracked repository names.
fn write_index(
    tracked: &[crate::tracked::TrackedRepo],
    out_dir: &Path,
) -> Result<(), SnapshotError> {
    let names: Vec<&str> = tracked.iter().map(|r| r.name.as_str()).collect();
    let path = out_dir.join("repos.json");
    let body = serde_json::to_string_pretty(&names).expect("name list serializes");
    fs::write(&path, body).map_err(|source| SnapshotError::Io {
        path: path.display().to_string(),
        source,
    })
}
