//! Watermark resolution: where to resume fetching from.

use chrono::{DateTime, Duration, Utc};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::entity::record_kind::RecordKind;
use crate::store::{self, Result};

/// A watermark older than this is treated as unreliable (stale seed data or
/// clock skew) rather than a real resume point.
pub const STALE_AFTER_DAYS: i64 = 365;

/// Stale watermarks are clamped to this far back from now. Refetching a
/// bounded trailing window beats refetching full history.
pub const CLAMP_LOOKBACK_DAYS: i64 = 7;

/// Resolve the fetch lower bound for a (repository, kind) partition.
///
/// Returns the most recent stored timestamp, clamped when stale, or `None`
/// when nothing is stored yet ("fetch everything" - the caller omits the
/// `since` parameter entirely).
pub async fn resolve(
    db: &DatabaseConnection,
    repository_id: Uuid,
    kind: RecordKind,
) -> Result<Option<DateTime<Utc>>> {
    let latest = store::activity::latest_timestamp(db, repository_id, kind).await?;
    Ok(latest.map(|ts| clamp_stale(ts, Utc::now())))
}

/// Clamp a stale watermark to a recent lookback window.
pub fn clamp_stale(watermark: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if watermark < now - Duration::days(STALE_AFTER_DAYS) {
        now - Duration::days(CLAMP_LOOKBACK_DAYS)
    } else {
        watermark
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_watermark_is_returned_unchanged() {
        let now = Utc::now();
        let watermark = now - Duration::days(3);
        assert_eq!(clamp_stale(watermark, now), watermark);
    }

    #[test]
    fn stale_watermark_is_clamped_to_lookback() {
        let now = Utc::now();
        let watermark = now - Duration::days(400);
        assert_eq!(clamp_stale(watermark, now), now - Duration::days(7));
    }

    #[test]
    fn boundary_watermark_is_not_clamped() {
        let now = Utc::now();
        let watermark = now - Duration::days(364);
        assert_eq!(clamp_stale(watermark, now), watermark);
    }

    mod with_db {
        use super::*;
        use crate::connect_and_migrate;
        use crate::normalize::{normalize_timestamp, NewActivity};
        use crate::store::repos;

        fn record(ts: &str) -> NewActivity {
            NewActivity {
                kind: RecordKind::Commit,
                author: "alice".to_string(),
                body: "msg".to_string(),
                occurred_at: normalize_timestamp(Some(ts)),
            }
        }

        #[tokio::test]
        async fn resolve_none_for_empty_partition() {
            let db = connect_and_migrate("sqlite::memory:").await.unwrap();
            let repo = repos::get_or_create(&db, "octo/widgets").await.unwrap();

            let since = resolve(&db, repo.id, RecordKind::Commit).await.unwrap();
            assert!(since.is_none());
        }

        #[tokio::test]
        async fn resolve_returns_max_stored_timestamp() {
            let db = connect_and_migrate("sqlite::memory:").await.unwrap();
            let repo = repos::get_or_create(&db, "octo/widgets").await.unwrap();

            let recent = Utc::now() - Duration::days(2);
            let older = Utc::now() - Duration::days(10);
            let records = vec![
                record(&older.to_rfc3339()),
                record(&recent.to_rfc3339()),
            ];
            store::activity::insert_many(&db, repo.id, RecordKind::Commit, &records)
                .await
                .unwrap();

            let since = resolve(&db, repo.id, RecordKind::Commit)
                .await
                .unwrap()
                .expect("watermark resolves");
            // Sub-second precision may be truncated by the store.
            assert!((since - recent).num_seconds().abs() <= 1);
        }

        #[tokio::test]
        async fn resolve_clamps_lone_stale_record() {
            let db = connect_and_migrate("sqlite::memory:").await.unwrap();
            let repo = repos::get_or_create(&db, "octo/widgets").await.unwrap();

            let stale = Utc::now() - Duration::days(400);
            store::activity::insert_many(
                &db,
                repo.id,
                RecordKind::Commit,
                &[record(&stale.to_rfc3339())],
            )
            .await
            .unwrap();

            let since = resolve(&db, repo.id, RecordKind::Commit)
                .await
                .unwrap()
                .expect("watermark resolves");

            let expected = Utc::now() - Duration::days(CLAMP_LOOKBACK_DAYS);
            assert!((since - expected).num_seconds().abs() <= 5);
        }
    }
}
