//! Issue entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An issue opened against a repository.
///
/// The issues endpoint also returns pull requests; those items are filtered
/// out during normalization, so this table holds plain issues only.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "issues")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owning repository.
    pub repository_id: Uuid,
    /// Issue title.
    #[sea_orm(column_type = "Text")]
    pub title: String,
    /// Login of the user who opened the issue.
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
