//! User management API handlers
//!
//! Super-admin endpoints; delegates to `UserService`.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::dto::{ListUsersParams, UpdateRoleRequest, UpdateUserRequest, UserDto};
use crate::application::UserService;
use crate::domain::{GetUserDto, UpdateUserDto, UserRole};
use crate::interfaces::http::common::{
    api_error, ApiError, ApiResponse, ApiResult, PaginatedResponse, ValidatedJson,
};

#[derive(Clone)]
pub struct UserHandlerState {
    pub users: Arc<UserService>,
}

fn parse_role(role: &str) -> Result<UserRole, ApiError> {
    role.parse::<UserRole>().map_err(api_error)
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(ListUsersParams),
    responses(
        (status = 200, description = "User list", body = ApiResponse<PaginatedResponse<UserDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Super admin only")
    )
)]
pub async fn list_users(
    State(state): State<UserHandlerState>,
    Query(params): Query<ListUsersParams>,
) -> ApiResult<PaginatedResponse<UserDto>> {
    let role = params.role.as_deref().map(parse_role).transpose()?;
    let dto = GetUserDto {
        search: params.search,
        role,
        page: Some(params.page),
        page_size: Some(params.page_size),
        sort_by: params.sort_by,
    };

    let result = state.users.list_users(dto).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(PaginatedResponse::from_result(
        result,
        UserDto::from,
    ))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_user(
    State(state): State<UserHandlerState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<UserDto> {
    let role = request.role.as_deref().map(parse_role).transpose()?;
    let dto = UpdateUserDto {
        first_name: request.first_name,
        last_name: request.last_name,
        role,
        is_active: request.is_active,
    };

    let user = state.users.update(&id, dto).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_user(
    State(state): State<UserHandlerState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.users.delete_user(&id).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(())))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/role",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = ApiResponse<UserDto>),
        (status = 400, description = "Unknown role"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_user_role(
    State(state): State<UserHandlerState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateRoleRequest>,
) -> ApiResult<UserDto> {
    let role = parse_role(&request.role)?;
    let user = state.users.update_role(&id, role).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}
