//! Authentication handlers
//!
//! Tokens come from the external identity provider. `POST /auth/sync`
//! turns the verified claims into a stored account on first login.

use std::sync::Arc;

use axum::{extract::State, Json};

use super::dto::{MeResponse, UpdateProfileRequest};
use crate::application::{PermissionService, UserService};
use crate::interfaces::http::common::{api_error, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::modules::users::UserDto;

#[derive(Clone)]
pub struct AuthHandlerState {
    pub users: Arc<UserService>,
    pub permissions: Arc<PermissionService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/sync",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Account created or refreshed", body = ApiResponse<UserDto>),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn sync_user(
    State(state): State<AuthHandlerState>,
    caller: AuthenticatedUser,
) -> ApiResult<UserDto> {
    let user = state
        .users
        .upsert_user(caller.claims.to_profile())
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = ApiResponse<MeResponse>),
        (status = 404, description = "Account not synced yet")
    )
)]
pub async fn get_current_user(
    State(state): State<AuthHandlerState>,
    caller: AuthenticatedUser,
) -> ApiResult<MeResponse> {
    let user = state.users.get_user(&caller.user_id).await.map_err(api_error)?;
    let permissions = state
        .permissions
        .effective_permissions(&caller.user_id)
        .await
        .map_err(api_error)?;

    Ok(Json(ApiResponse::success(MeResponse {
        user: UserDto::from(user),
        permissions: permissions.iter().map(|p| p.as_str().to_string()).collect(),
    })))
}

#[utoipa::path(
    patch,
    path = "/api/v1/profile",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserDto>),
        (status = 422, description = "Validation error")
    )
)]
pub async fn update_profile(
    State(state): State<AuthHandlerState>,
    caller: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<UserDto> {
    let user = state
        .users
        .update_profile(&caller.user_id, request.first_name, request.last_name)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}
