use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{RolePermission, UserPermission};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RolePermissionDto {
    pub id: i32,
    pub role: String,
    pub permission: String,
    pub is_granted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<RolePermission> for RolePermissionDto {
    fn from(r: RolePermission) -> Self {
        Self {
            id: r.id,
            role: r.role.as_str().to_string(),
            permission: r.permission.as_str().to_string(),
            is_granted: r.is_granted,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserPermissionDto {
    pub id: i32,
    pub user_id: String,
    pub permission: String,
    pub is_granted: bool,
    pub granted_by: Option<String>,
    pub reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<UserPermission> for UserPermissionDto {
    fn from(o: UserPermission) -> Self {
        Self {
            id: o.id,
            user_id: o.user_id,
            permission: o.permission.as_str().to_string(),
            is_granted: o.is_granted,
            granted_by: o.granted_by,
            reason: o.reason,
            expires_at: o.expires_at,
            created_at: o.created_at,
        }
    }
}

/// Full replacement of a role's granted set
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReplaceRolePermissionsRequest {
    #[validate(length(max = 14))]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetUserPermissionRequest {
    #[validate(length(min = 1))]
    pub permission: String,
    pub is_granted: bool,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionCheckResponse {
    pub permission: String,
    pub granted: bool,
}
