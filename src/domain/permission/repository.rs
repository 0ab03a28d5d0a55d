use async_trait::async_trait;

use super::{NewUserOverride, Permission, RolePermission, UserPermission};
use crate::domain::user::UserRole;
use crate::shared::errors::DomainResult;

#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Whether a granted `(role, permission)` row exists.
    async fn role_grants(&self, role: UserRole, permission: Permission) -> DomainResult<bool>;
    async fn role_permissions(&self, role: UserRole) -> DomainResult<Vec<RolePermission>>;

    /// Delete every row of `role` and insert `permissions` as granted, atomically.
    async fn replace_role_permissions(
        &self,
        role: UserRole,
        permissions: &[Permission],
    ) -> DomainResult<()>;

    /// Delete every role row and insert `table` as granted, atomically.
    async fn reset_role_permissions(
        &self,
        table: &[(UserRole, Vec<Permission>)],
    ) -> DomainResult<()>;

    async fn user_override(
        &self,
        user_id: &str,
        permission: Permission,
    ) -> DomainResult<Option<UserPermission>>;
    async fn user_overrides(&self, user_id: &str) -> DomainResult<Vec<UserPermission>>;

    /// Insert or replace the single override for `(user_id, permission)`.
    async fn upsert_user_override(&self, dto: NewUserOverride) -> DomainResult<UserPermission>;

    /// Returns `false` when no override existed.
    async fn delete_user_override(&self, user_id: &str, permission: Permission)
        -> DomainResult<bool>;
}
