//! Pull request entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A pull request opened against a repository.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pull_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owning repository.
    pub repository_id: Uuid,
    /// Pull request title.
    #[sea_orm(column_type = "Text")]
    pub title: String,
    /// Login of the user who opened the pull request.
    pub author: String,
    /// Creation time, normalized to UTC.
    pub created_at: DateTimeWithTimeZone,
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
