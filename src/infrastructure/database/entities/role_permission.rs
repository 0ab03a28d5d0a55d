//! Role default permission rows

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::user::UserRole;

/// Stored permission name, shared with `user_permissions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
pub enum PermissionName {
    #[sea_orm(string_value = "manage_users")]
    ManageUsers,
    #[sea_orm(string_value = "manage_modules")]
    ManageModules,
    #[sea_orm(string_value = "manage_content")]
    ManageContent,
    #[sea_orm(string_value = "manage_quizzes")]
    ManageQuizzes,
    #[sea_orm(string_value = "manage_assignments")]
    ManageAssignments,
    #[sea_orm(string_value = "grade_assignments")]
    GradeAssignments,
    #[sea_orm(string_value = "view_analytics")]
    ViewAnalytics,
    #[sea_orm(string_value = "manage_certificates")]
    ManageCertificates,
    #[sea_orm(string_value = "moderate_forums")]
    ModerateForums,
    #[sea_orm(string_value = "manage_enrollments")]
    ManageEnrollments,
    #[sea_orm(string_value = "system_settings")]
    SystemSettings,
    #[sea_orm(string_value = "backup_data")]
    BackupData,
    #[sea_orm(string_value = "manage_quotes")]
    ManageQuotes,
    #[sea_orm(string_value = "manage_website_settings")]
    ManageWebsiteSettings,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "role_permissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub role: UserRole,
    pub permission: PermissionName,
    pub is_granted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
