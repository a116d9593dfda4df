//! Repository row operations.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entity::repository::{ActiveModel, Column, Entity as Repository, Model};

use super::errors::{Result, StoreError};

/// Find a repository by its `owner/name` reference.
pub async fn find_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<Model>> {
    Repository::find()
        .filter(Column::Name.eq(name))
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Get or create a repository row for the given `owner/name` reference.
///
/// Lookup by name; insert a default row if absent. An existing match is
/// never updated - repository rows are immutable after creation.
///
/// # Errors
/// Returns `StoreError::InvalidInput` if the reference is not of the form
/// `owner/name`, or `StoreError::Database` on a failed query.
pub async fn get_or_create(db: &DatabaseConnection, name: &str) -> Result<Model> {
    let (owner, repo) = name.split_once('/').unwrap_or(("", ""));
    if owner.is_empty() || repo.is_empty() {
        return Err(StoreError::invalid_input(format!(
            "repository reference must be owner/name, got `{}`",
            name
        )));
    }

    if let Some(existing) = find_by_name(db, name).await? {
        return Ok(existing);
    }

    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        created_at: Set(Utc::now().fixed_offset()),
    };

    model.insert(db).await.map_err(StoreError::from)
}

#[cfg(all(test, feature = "migrate"))]
mod tests {
    use super::*;
    use crate::connect_and_migrate;

    async fn setup_db() -> DatabaseConnection {
        connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db should migrate")
    }

    #[tokio::test]
    async fn get_or_create_inserts_on_first_encounter() {
        let db = setup_db().await;

        let repo = get_or_create(&db, "octo/widgets").await.expect("insert");
        assert_eq!(repo.name, "octo/widgets");
        assert_ne!(repo.id, Uuid::nil());
    }

    #[tokio::test]
    async fn get_or_create_is_stable_across_calls() {
        let db = setup_db().await;

        let first = get_or_create(&db, "octo/widgets").await.expect("insert");
        let second = get_or_create(&db, "octo/widgets").await.expect("lookup");

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
    }

    #[tokio::test]
    async fn get_or_create_rejects_malformed_reference() {
        let db = setup_db().await;

        for bad in ["widgets", "/widgets", "octo/", ""] {
            let err = get_or_create(&db, bad).await.expect_err("should reject");
            assert!(matches!(err, StoreError::InvalidInput { .. }), "{bad}");
        }
    }

    #[tokio::test]
    async fn find_by_name_returns_none_for_unknown() {
        let db = setup_db().await;
        let found = find_by_name(&db, "no/such").await.expect("query");
        assert!(found.is_none());
    }
}
