//! Permission administration handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    PermissionCheckResponse, ReplaceRolePermissionsRequest, RolePermissionDto,
    SetUserPermissionRequest, UserPermissionDto,
};
use crate::application::authorization::SetOverride;
use crate::application::PermissionService;
use crate::domain::{Permission, UserRole};
use crate::interfaces::http::common::{
    api_error, ApiError, ApiResponse, ApiResult, ValidatedJson,
};
use crate::interfaces::http::middleware::AuthenticatedUser;

#[derive(Clone)]
pub struct PermissionHandlerState {
    pub permissions: Arc<PermissionService>,
}

fn parse_permission(name: &str) -> Result<Permission, ApiError> {
    name.parse::<Permission>().map_err(api_error)
}

fn parse_role(name: &str) -> Result<UserRole, ApiError> {
    name.parse::<UserRole>().map_err(api_error)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/permissions",
    tag = "Permissions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Every known permission in canonical order", body = ApiResponse<Vec<String>>),
        (status = 403, description = "Requires manage_users")
    )
)]
pub async fn list_permissions() -> ApiResult<Vec<String>> {
    Ok(Json(ApiResponse::success(
        Permission::ALL.iter().map(|p| p.as_str().to_string()).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/roles/{role}/permissions",
    tag = "Permissions",
    security(("bearer_auth" = [])),
    params(("role" = String, Path, description = "super_admin, teacher or student")),
    responses(
        (status = 200, description = "Role rows", body = ApiResponse<Vec<RolePermissionDto>>),
        (status = 400, description = "Unknown role")
    )
)]
pub async fn get_role_permissions(
    State(state): State<PermissionHandlerState>,
    Path(role): Path<String>,
) -> ApiResult<Vec<RolePermissionDto>> {
    let role = parse_role(&role)?;
    let rows = state
        .permissions
        .role_permissions(role)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(
        rows.into_iter().map(RolePermissionDto::from).collect(),
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/roles/{role}/permissions",
    tag = "Permissions",
    security(("bearer_auth" = [])),
    params(("role" = String, Path, description = "super_admin, teacher or student")),
    request_body = ReplaceRolePermissionsRequest,
    responses(
        (status = 200, description = "Role set replaced", body = ApiResponse<Vec<RolePermissionDto>>),
        (status = 400, description = "Unknown role or permission")
    )
)]
pub async fn replace_role_permissions(
    State(state): State<PermissionHandlerState>,
    Path(role): Path<String>,
    ValidatedJson(request): ValidatedJson<ReplaceRolePermissionsRequest>,
) -> ApiResult<Vec<RolePermissionDto>> {
    let role = parse_role(&role)?;
    let permissions = request
        .permissions
        .iter()
        .map(|p| parse_permission(p))
        .collect::<Result<Vec<_>, _>>()?;

    let rows = state
        .permissions
        .replace_role_permissions(role, &permissions)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(
        rows.into_iter().map(RolePermissionDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users/{id}/permissions",
    tag = "Permissions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User overrides", body = ApiResponse<Vec<UserPermissionDto>>),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_user_permissions(
    State(state): State<PermissionHandlerState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<UserPermissionDto>> {
    let rows = state.permissions.user_overrides(&id).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(
        rows.into_iter().map(UserPermissionDto::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{id}/permissions",
    tag = "Permissions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = SetUserPermissionRequest,
    responses(
        (status = 201, description = "Override set", body = ApiResponse<UserPermissionDto>),
        (status = 400, description = "Unknown permission or past expiry"),
        (status = 404, description = "User not found")
    )
)]
pub async fn set_user_permission(
    State(state): State<PermissionHandlerState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<SetUserPermissionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserPermissionDto>>), ApiError> {
    let input = SetOverride {
        permission: parse_permission(&request.permission)?,
        is_granted: request.is_granted,
        reason: request.reason,
        expires_at: request.expires_at,
    };

    let row = state
        .permissions
        .set_user_override(&id, input, Some(&caller.user_id))
        .await
        .map_err(api_error)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserPermissionDto::from(row))),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/users/{id}/permissions/{permission}",
    tag = "Permissions",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "User ID"),
        ("permission" = String, Path, description = "Permission name")
    ),
    responses(
        (status = 200, description = "Override removed"),
        (status = 404, description = "No such override")
    )
)]
pub async fn remove_user_permission(
    State(state): State<PermissionHandlerState>,
    Path((id, permission)): Path<(String, String)>,
) -> ApiResult<()> {
    let permission = parse_permission(&permission)?;
    state
        .permissions
        .remove_user_override(&id, permission)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(())))
}

#[utoipa::path(
    get,
    path = "/api/v1/permissions/check/{permission}",
    tag = "Permissions",
    security(("bearer_auth" = [])),
    params(("permission" = String, Path, description = "Permission name")),
    responses(
        (status = 200, description = "Resolution for the caller", body = ApiResponse<PermissionCheckResponse>),
        (status = 400, description = "Unknown permission")
    )
)]
pub async fn check_permission(
    State(state): State<PermissionHandlerState>,
    caller: AuthenticatedUser,
    Path(permission): Path<String>,
) -> ApiResult<PermissionCheckResponse> {
    let permission = parse_permission(&permission)?;
    let granted = state
        .permissions
        .has_permission(&caller.user_id, permission)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(PermissionCheckResponse {
        permission: permission.as_str().to_string(),
        granted,
    })))
}
