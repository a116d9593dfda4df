//! Activity record operations, uniform across the four record kinds.
//!
//! Each operation dispatches on [`RecordKind`] to the matching entity. The
//! four tables share one logical shape (body, author, timestamp), so the
//! sync engine only ever talks to this module, never to a concrete entity.

use std::collections::HashSet;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::record_kind::RecordKind;
use crate::entity::{commit, issue, pull_request, review};
use crate::normalize::{key_timestamp, NaturalKey, NewActivity};

use super::errors::{Result, StoreError};

/// Insert a batch of activity records for one repository and kind.
///
/// An empty batch is a no-op. Returns the number of rows written.
pub async fn insert_many(
    db: &DatabaseConnection,
    repository_id: Uuid,
    kind: RecordKind,
    records: &[NewActivity],
) -> Result<usize> {
    if records.is_empty() {
        return Ok(0);
    }
    debug_assert!(records.iter().all(|r| r.kind == kind));

    match kind {
        RecordKind::Commit => {
            let models = records.iter().map(|r| commit::ActiveModel {
                id: Set(Uuid::new_v4()),
                repository_id: Set(repository_id),
                message: Set(r.body.clone()),
                author: Set(r.author.clone()),
                committed_at: Set(r.occurred_at),
            });
            commit::Entity::insert_many(models).exec(db).await?;
        }
        RecordKind::PullRequest => {
            let models = records.iter().map(|r| pull_request::ActiveModel {
                id: Set(Uuid::new_v4()),
                repository_id: Set(repository_id),
                title: Set(r.body.clone()),
                author: Set(r.author.clone()),
                created_at: Set(r.occurred_at),
            });
            pull_request::Entity::insert_many(models).exec(db).await?;
        }
        RecordKind::Issue => {
            let models = records.iter().map(|r| issue::ActiveModel {
                id: Set(Uuid::new_v4()),
                repository_id: Set(repository_id),
                title: Set(r.body.clone()),
                author: Set(r.author.clone()),
                created_at: Set(r.occurred_at),
            });
            issue::Entity::insert_many(models).exec(db).await?;
        }
        RecordKind::Review => {
            let models = records.iter().map(|r| review::ActiveModel {
                id: Set(Uuid::new_v4()),
                repository_id: Set(repository_id),
                comment: Set(r.body.clone()),
                author: Set(r.author.clone()),
                created_at: Set(r.occurred_at),
            });
            review::Entity::insert_many(models).exec(db).await?;
        }
    }

    Ok(records.len())
}

/// Insert a batch with automatic retry on transient database errors.
///
/// Uses exponential backoff with jitter; non-transient errors (constraint
/// violations, malformed statements) fail immediately.
pub async fn insert_many_with_retry(
    db: &DatabaseConnection,
    repository_id: Uuid,
    kind: RecordKind,
    records: &[NewActivity],
    attempts: usize,
    initial_backoff_ms: u64,
) -> Result<usize> {
    let backoff = ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(initial_backoff_ms))
        .with_max_times(attempts)
        .with_jitter();

    (|| async { insert_many(db, repository_id, kind, records).await })
        .retry(backoff)
        .when(is_transient)
        .notify(|err, dur| {
            tracing::debug!(error = %err, retry_in = ?dur, "Retrying activity insert");
        })
        .await
}

/// Whether a store error is worth retrying.
fn is_transient(err: &StoreError) -> bool {
    matches!(
        err,
        StoreError::Database(sea_orm::DbErr::Conn(_))
            | StoreError::Database(sea_orm::DbErr::ConnectionAcquire(_))
    )
}

/// Latest stored timestamp for a (repository, kind) partition.
///
/// Returns `None` when no records of the kind exist yet. This is the raw
/// watermark; staleness clamping happens in the resolver.
pub async fn latest_timestamp(
    db: &DatabaseConnection,
    repository_id: Uuid,
    kind: RecordKind,
) -> Result<Option<DateTime<Utc>>> {
    let ts = match kind {
        RecordKind::Commit => commit::Entity::find()
            .filter(commit::Column::RepositoryId.eq(repository_id))
            .order_by_desc(commit::Column::CommittedAt)
            .one(db)
            .await?
            .map(|m| m.committed_at),
        RecordKind::PullRequest => pull_request::Entity::find()
            .filter(pull_request::Column::RepositoryId.eq(repository_id))
            .order_by_desc(pull_request::Column::CreatedAt)
            .one(db)
            .await?
            .map(|m| m.created_at),
        RecordKind::Issue => issue::Entity::find()
            .filter(issue::Column::RepositoryId.eq(repository_id))
            .order_by_desc(issue::Column::CreatedAt)
            .one(db)
            .await?
            .map(|m| m.created_at),
        RecordKind::Review => review::Entity::find()
            .filter(review::Column::RepositoryId.eq(repository_id))
            .order_by_desc(review::Column::CreatedAt)
            .one(db)
            .await?
            .map(|m| m.created_at),
    };

    Ok(ts.map(|t| t.with_timezone(&Utc)))
}

/// Natural keys of every stored record in a (repository, kind) partition.
///
/// One query per partition; the deduplicator diffs candidates against this
/// set in memory.
pub async fn existing_keys(
    db: &DatabaseConnection,
    repository_id: Uuid,
    kind: RecordKind,
) -> Result<HashSet<NaturalKey>> {
    let keys = match kind {
        RecordKind::Commit => commit::Entity::find()
            .filter(commit::Column::RepositoryId.eq(repository_id))
            .all(db)
            .await?
            .into_iter()
            .map(|m| (m.message, m.author, key_timestamp(&m.committed_at)))
            .collect(),
        RecordKind::PullRequest => pull_request::Entity::find()
            .filter(pull_request::Column::RepositoryId.eq(repository_id))
            .all(db)
            .await?
            .into_iter()
            .map(|m| (m.title, m.author, key_timestamp(&m.created_at)))
            .collect(),
        RecordKind::Issue => issue::Entity::find()
            .filter(issue::Column::RepositoryId.eq(repository_id))
            .all(db)
            .await?
            .into_iter()
            .map(|m| (m.title, m.author, key_timestamp(&m.created_at)))
            .collect(),
        RecordKind::Review => review::Entity::find()
            .filter(review::Column::RepositoryId.eq(repository_id))
            .all(db)
            .await?
            .into_iter()
            .map(|m| (m.comment, m.author, key_timestamp(&m.created_at)))
            .collect(),
    };

    Ok(keys)
}

/// Count stored records in a (repository, kind) partition.
pub async fn count(
    db: &DatabaseConnection,
    repository_id: Uuid,
    kind: RecordKind,
) -> Result<u64> {
    use sea_orm::PaginatorTrait;

    let n = match kind {
        RecordKind::Commit => {
            commit::Entity::find()
                .filter(commit::Column::RepositoryId.eq(repository_id))
                .count(db)
                .await?
        }
        RecordKind::PullRequest => {
            pull_request::Entity::find()
                .filter(pull_request::Column::RepositoryId.eq(repository_id))
                .count(db)
                .await?
        }
        RecordKind::Issue => {
            issue::Entity::find()
                .filter(issue::Column::RepositoryId.eq(repository_id))
                .count(db)
                .await?
        }
        RecordKind::Review => {
            review::Entity::find()
                .filter(review::Column::RepositoryId.eq(repository_id))
                .count(db)
                .await?
        }
    };

    Ok(n)
}

/// Delete stored activity for a repository within optional timestamp bounds.
///
/// Used only by the full-range sync mode to wipe a window before
/// refetching. All four kinds are cleared; `since`/`until` bound the kind's
/// own timestamp column. Returns total rows deleted.
pub async fn delete_range(
    db: &DatabaseConnection,
    repository_id: Uuid,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> Result<u64> {
    let since = since.map(|t| t.fixed_offset());
    let until = until.map(|t| t.fixed_offset());
    let mut total = 0u64;

    let mut del = commit::Entity::delete_many()
        .filter(commit::Column::RepositoryId.eq(repository_id));
    if let Some(since) = since {
        del = del.filter(commit::Column::CommittedAt.gte(since));
    }
    if let Some(until) = until {
        del = del.filter(commit::Column::CommittedAt.lte(until));
    }
    total += del.exec(db).await?.rows_affected;

    let mut del = pull_request::Entity::delete_many()
        .filter(pull_request::Column::RepositoryId.eq(repository_id));
    if let Some(since) = since {
        del = del.filter(pull_request::Column::CreatedAt.gte(since));
    }
    if let Some(until) = until {
        del = del.filter(pull_request::Column::CreatedAt.lte(until));
    }
    total += del.exec(db).await?.rows_affected;

    let mut del = issue::Entity::delete_many()
        .filter(issue::Column::RepositoryId.eq(repository_id));
    if let Some(since) = since {
        del = del.filter(issue::Column::CreatedAt.gte(since));
    }
    if let Some(until) = until {
        del = del.filter(issue::Column::CreatedAt.lte(until));
    }
    total += del.exec(db).await?.rows_affected;

    let mut del = review::Entity::delete_many()
        .filter(review::Column::RepositoryId.eq(repository_id));
    if let Some(since) = since {
        del = del.filter(review::Column::CreatedAt.gte(since));
    }
    if let Some(until) = until {
        del = del.filter(review::Column::CreatedAt.lte(until));
    }
    total += del.exec(db).await?.rows_affected;

    Ok(total)
}
