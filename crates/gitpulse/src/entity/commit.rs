//! Commit entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A commit fetched from a repository's history.
///
/// Rows are insert-only. Within one repository the natural key
/// (message, author, committed_at) is unique by construction: the
/// deduplicator drops candidates that match a stored row before insert.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owning repository.
    pub repository_id: Uuid,
    /// Full commit message.
    #[sea_orm(column_type = "Text")]
    pub message: String,
    /// Commit author name.
    pub author: String,
    /// Author date, normalized to UTC.
    pub committed_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::repository::Entity",
        from = "Column::RepositoryId",
        to = "super::repository::Column::Id"
    )]
    Repository,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
