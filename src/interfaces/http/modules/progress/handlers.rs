//! Stage progress handlers
//!
//! Always scoped to the calling user; nobody records progress for someone
//! else.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use super::dto::{
    RecordProgressRequest, StageProgressDto, StageProgressView, ValidateInteractionRequest,
    ValidateInteractionResponse,
};
use crate::application::ProgressService;
use crate::interfaces::http::common::{api_error, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;

#[derive(Clone)]
pub struct ProgressHandlerState {
    pub progress: Arc<ProgressService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/stages/{id}/progress",
    tag = "Progress",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Stage ID")),
    responses((status = 200, description = "Caller's progress on the stage", body = ApiResponse<StageProgressView>))
)]
pub async fn get_stage_progress(
    State(state): State<ProgressHandlerState>,
    caller: AuthenticatedUser,
    Path(stage_id): Path<i32>,
) -> ApiResult<StageProgressView> {
    let progress = state
        .progress
        .stage_progress(&caller.user_id, stage_id)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(StageProgressView::new(
        stage_id, progress,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/stages/{id}/progress",
    tag = "Progress",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Stage ID")),
    request_body = RecordProgressRequest,
    responses(
        (status = 200, description = "Progress merged", body = ApiResponse<StageProgressDto>),
        (status = 404, description = "Stage not found"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn record_progress(
    State(state): State<ProgressHandlerState>,
    caller: AuthenticatedUser,
    Path(stage_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<RecordProgressRequest>,
) -> ApiResult<StageProgressDto> {
    let progress = state
        .progress
        .record_progress(&caller.user_id, stage_id, request.into())
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(StageProgressDto::from(progress))))
}

#[utoipa::path(
    post,
    path = "/api/v1/stages/{id}/complete",
    tag = "Progress",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Stage ID")),
    responses(
        (status = 200, description = "Stage completed", body = ApiResponse<StageProgressDto>),
        (status = 404, description = "Stage not found")
    )
)]
pub async fn complete_stage(
    State(state): State<ProgressHandlerState>,
    caller: AuthenticatedUser,
    Path(stage_id): Path<i32>,
) -> ApiResult<StageProgressDto> {
    let progress = state
        .progress
        .complete_stage(&caller.user_id, stage_id)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(StageProgressDto::from(progress))))
}

#[utoipa::path(
    post,
    path = "/api/v1/stages/{id}/validate",
    tag = "Progress",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Stage ID")),
    request_body = ValidateInteractionRequest,
    responses((status = 200, description = "Whether the telemetry satisfies the stage", body = ApiResponse<ValidateInteractionResponse>))
)]
pub async fn validate_interaction(
    State(state): State<ProgressHandlerState>,
    caller: AuthenticatedUser,
    Path(stage_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<ValidateInteractionRequest>,
) -> ApiResult<ValidateInteractionResponse> {
    let is_valid = state
        .progress
        .validate_interaction(&caller.user_id, stage_id, &request.into())
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(ValidateInteractionResponse {
        is_valid,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/progress/modules/{id}",
    tag = "Progress",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Module ID")),
    responses(
        (status = 200, description = "Caller's progress rows in the module", body = ApiResponse<Vec<StageProgressDto>>),
        (status = 404, description = "Module not found")
    )
)]
pub async fn module_progress(
    State(state): State<ProgressHandlerState>,
    caller: AuthenticatedUser,
    Path(module_id): Path<i32>,
) -> ApiResult<Vec<StageProgressDto>> {
    let rows = state
        .progress
        .module_progress(&caller.user_id, module_id)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(
        rows.into_iter().map(StageProgressDto::from).collect(),
    )))
}
