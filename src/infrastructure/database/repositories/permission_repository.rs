use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait,
};

use super::db_err;
use super::user_repository::{domain_role_to_entity, entity_role_to_domain};
use crate::domain::{
    DomainError, DomainResult, NewUserOverride, Permission, PermissionRepository, RolePermission,
    UserPermission, UserRole,
};
use crate::infrastructure::database::entities::role_permission::{self, PermissionName};
use crate::infrastructure::database::entities::user_permission;

pub struct SeaOrmPermissionRepository {
    db: DatabaseConnection,
}

impl SeaOrmPermissionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn entity_permission_to_domain(p: PermissionName) -> Permission {
    match p {
        PermissionName::ManageUsers => Permission::ManageUsers,
        PermissionName::ManageModules => Permission::ManageModules,
        PermissionName::ManageContent => Permission::ManageContent,
        PermissionName::ManageQuizzes => Permission::ManageQuizzes,
        PermissionName::ManageAssignments => Permission::ManageAssignments,
        PermissionName::GradeAssignments => Permission::GradeAssignments,
        PermissionName::ViewAnalytics => Permission::ViewAnalytics,
        PermissionName::ManageCertificates => Permission::ManageCertificates,
        PermissionName::ModerateForums => Permission::ModerateForums,
        PermissionName::ManageEnrollments => Permission::ManageEnrollments,
        PermissionName::SystemSettings => Permission::SystemSettings,
        PermissionName::BackupData => Permission::BackupData,
        PermissionName::ManageQuotes => Permission::ManageQuotes,
        PermissionName::ManageWebsiteSettings => Permission::ManageWebsiteSettings,
    }
}

fn domain_permission_to_entity(p: Permission) -> PermissionName {
    match p {
        Permission::ManageUsers => PermissionName::ManageUsers,
        Permission::ManageModules => PermissionName::ManageModules,
        Permission::ManageContent => PermissionName::ManageContent,
        Permission::ManageQuizzes => PermissionName::ManageQuizzes,
        Permission::ManageAssignments => PermissionName::ManageAssignments,
        Permission::GradeAssignments => PermissionName::GradeAssignments,
        Permission::ViewAnalytics => PermissionName::ViewAnalytics,
        Permission::ManageCertificates => PermissionName::ManageCertificates,
        Permission::ModerateForums => PermissionName::ModerateForums,
        Permission::ManageEnrollments => PermissionName::ManageEnrollments,
        Permission::SystemSettings => PermissionName::SystemSettings,
        Permission::BackupData => PermissionName::BackupData,
        Permission::ManageQuotes => PermissionName::ManageQuotes,
        Permission::ManageWebsiteSettings => PermissionName::ManageWebsiteSettings,
    }
}

fn role_permission_model_to_domain(model: role_permission::Model) -> RolePermission {
    RolePermission {
        id: model.id,
        role: entity_role_to_domain(model.role),
        permission: entity_permission_to_domain(model.permission),
        is_granted: model.is_granted,
        created_at: model.created_at,
    }
}

fn user_permission_model_to_domain(model: user_permission::Model) -> UserPermission {
    UserPermission {
        id: model.id,
        user_id: model.user_id,
        permission: entity_permission_to_domain(model.permission),
        is_granted: model.is_granted,
        granted_by: model.granted_by,
        reason: model.reason,
        expires_at: model.expires_at,
        created_at: model.created_at,
    }
}

fn granted_rows(
    role: UserRole,
    permissions: &[Permission],
    now: DateTime<Utc>,
) -> Vec<role_permission::ActiveModel> {
    permissions
        .iter()
        .map(|&p| role_permission::ActiveModel {
            role: Set(domain_role_to_entity(role)),
            permission: Set(domain_permission_to_entity(p)),
            is_granted: Set(true),
            created_at: Set(now),
            ..Default::default()
        })
        .collect()
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl PermissionRepository for SeaOrmPermissionRepository {
    async fn role_grants(&self, role: UserRole, permission: Permission) -> DomainResult<bool> {
        let row = role_permission::Entity::find()
            .filter(role_permission::Column::Role.eq(domain_role_to_entity(role)))
            .filter(role_permission::Column::Permission.eq(domain_permission_to_entity(permission)))
            .filter(role_permission::Column::IsGranted.eq(true))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(row.is_some())
    }

    async fn role_permissions(&self, role: UserRole) -> DomainResult<Vec<RolePermission>> {
        let mut rows: Vec<RolePermission> = role_permission::Entity::find()
            .filter(role_permission::Column::Role.eq(domain_role_to_entity(role)))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(role_permission_model_to_domain)
            .collect();
        // string column order is alphabetical; list in canonical order instead
        rows.sort_by_key(|r| r.permission);
        Ok(rows)
    }

    async fn replace_role_permissions(
        &self,
        role: UserRole,
        permissions: &[Permission],
    ) -> DomainResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;

        role_permission::Entity::delete_many()
            .filter(role_permission::Column::Role.eq(domain_role_to_entity(role)))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let rows = granted_rows(role, permissions, Utc::now());
        if !rows.is_empty() {
            role_permission::Entity::insert_many(rows)
                .exec_without_returning(&txn)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)
    }

    async fn reset_role_permissions(
        &self,
        table: &[(UserRole, Vec<Permission>)],
    ) -> DomainResult<()> {
        let now = Utc::now();
        let txn = self.db.begin().await.map_err(db_err)?;

        role_permission::Entity::delete_many()
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let rows: Vec<role_permission::ActiveModel> = table
            .iter()
            .flat_map(|(role, permissions)| granted_rows(*role, permissions, now))
            .collect();
        if !rows.is_empty() {
            role_permission::Entity::insert_many(rows)
                .exec_without_returning(&txn)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)
    }

    async fn user_override(
        &self,
        user_id: &str,
        permission: Permission,
    ) -> DomainResult<Option<UserPermission>> {
        let model = user_permission::Entity::find()
            .filter(user_permission::Column::UserId.eq(user_id))
            .filter(user_permission::Column::Permission.eq(domain_permission_to_entity(permission)))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_permission_model_to_domain))
    }

    async fn user_overrides(&self, user_id: &str) -> DomainResult<Vec<UserPermission>> {
        let mut rows: Vec<UserPermission> = user_permission::Entity::find()
            .filter(user_permission::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(user_permission_model_to_domain)
            .collect();
        rows.sort_by_key(|o| o.permission);
        Ok(rows)
    }

    async fn upsert_user_override(&self, dto: NewUserOverride) -> DomainResult<UserPermission> {
        let user_id = dto.user_id.clone();
        let permission = dto.permission;

        let model = user_permission::ActiveModel {
            user_id: Set(dto.user_id),
            permission: Set(domain_permission_to_entity(dto.permission)),
            is_granted: Set(dto.is_granted),
            granted_by: Set(dto.granted_by),
            reason: Set(dto.reason),
            expires_at: Set(dto.expires_at),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let txn = self.db.begin().await.map_err(db_err)?;

        user_permission::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    user_permission::Column::UserId,
                    user_permission::Column::Permission,
                ])
                .update_columns([
                    user_permission::Column::IsGranted,
                    user_permission::Column::GrantedBy,
                    user_permission::Column::Reason,
                    user_permission::Column::ExpiresAt,
                    user_permission::Column::CreatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .map_err(db_err)?;

        let row = user_permission::Entity::find()
            .filter(user_permission::Column::UserId.eq(user_id.as_str()))
            .filter(user_permission::Column::Permission.eq(domain_permission_to_entity(permission)))
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| {
                DomainError::Storage(format!(
                    "Override {}/{} vanished after upsert",
                    user_id, permission
                ))
            })?;

        txn.commit().await.map_err(db_err)?;
        Ok(user_permission_model_to_domain(row))
    }

    async fn delete_user_override(
        &self,
        user_id: &str,
        permission: Permission,
    ) -> DomainResult<bool> {
        let result = user_permission::Entity::delete_many()
            .filter(user_permission::Column::UserId.eq(user_id))
            .filter(user_permission::Column::Permission.eq(domain_permission_to_entity(permission)))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected > 0)
    }
}
