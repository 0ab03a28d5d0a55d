//! Module stage entity

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "module_stages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub module_id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// JSON document authored by teachers
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    pub order_index: i32,
    pub prerequisite_stage_id: Option<i32>,
    pub min_time_minutes: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::learning_module::Entity",
        from = "Column::ModuleId",
        to = "super::learning_module::Column::Id",
        on_delete = "Cascade"
    )]
    Module,
    #[sea_orm(has_many = "super::stage_progress::Entity")]
    Progress,
}

impl Related<super::learning_module::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Module.def()
    }
}

impl Related<super::stage_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Progress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
