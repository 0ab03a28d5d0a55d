//! Module and stage handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    content_text, CreateModuleRequest, CreateStageRequest, ModuleDto, StageDto,
    UpdateModuleRequest, UpdateStageRequest,
};
use crate::application::ContentService;
use crate::domain::{CreateModuleDto, CreateStageDto, UpdateModuleDto, UpdateStageDto};
use crate::interfaces::http::common::{api_error, ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;

#[derive(Clone)]
pub struct ContentHandlerState {
    pub content: Arc<ContentService>,
}

type Created<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

// ── Modules ────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/v1/modules",
    tag = "Content",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Active modules", body = ApiResponse<Vec<ModuleDto>>))
)]
pub async fn list_modules(State(state): State<ContentHandlerState>) -> ApiResult<Vec<ModuleDto>> {
    let modules = state.content.list_modules().await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(
        modules.into_iter().map(ModuleDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/modules/{id}",
    tag = "Content",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Module ID")),
    responses(
        (status = 200, description = "Module", body = ApiResponse<ModuleDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_module(
    State(state): State<ContentHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<ModuleDto> {
    let module = state.content.get_module(id).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(ModuleDto::from(module))))
}

#[utoipa::path(
    get,
    path = "/api/v1/modules/{id}/stages",
    tag = "Content",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Module ID")),
    responses(
        (status = 200, description = "Stages in order", body = ApiResponse<Vec<StageDto>>),
        (status = 404, description = "Module not found")
    )
)]
pub async fn list_module_stages(
    State(state): State<ContentHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<StageDto>> {
    let stages = state.content.list_stages(id).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(
        stages.into_iter().map(StageDto::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/modules",
    tag = "Content",
    security(("bearer_auth" = [])),
    request_body = CreateModuleRequest,
    responses(
        (status = 201, description = "Module created", body = ApiResponse<ModuleDto>),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_module(
    State(state): State<ContentHandlerState>,
    caller: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateModuleRequest>,
) -> Created<ModuleDto> {
    let dto = CreateModuleDto {
        title: request.title,
        description: request.description,
        created_by: Some(caller.user_id),
    };
    let module = state.content.create_module(dto).await.map_err(api_error)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ModuleDto::from(module))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/modules/{id}",
    tag = "Content",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Module ID")),
    request_body = UpdateModuleRequest,
    responses(
        (status = 200, description = "Module updated", body = ApiResponse<ModuleDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_module(
    State(state): State<ContentHandlerState>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateModuleRequest>,
) -> ApiResult<ModuleDto> {
    let dto = UpdateModuleDto {
        title: request.title,
        description: request.description,
        is_active: request.is_active,
    };
    let module = state.content.update_module(id, dto).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(ModuleDto::from(module))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/modules/{id}",
    tag = "Content",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Module ID")),
    responses(
        (status = 200, description = "Module deactivated"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_module(
    State(state): State<ContentHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<()> {
    state.content.delete_module(id).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(())))
}

// ── Stages ─────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/v1/stages/all",
    tag = "Content",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Every stage", body = ApiResponse<Vec<StageDto>>),
        (status = 403, description = "Super admin only")
    )
)]
pub async fn list_all_stages(State(state): State<ContentHandlerState>) -> ApiResult<Vec<StageDto>> {
    let stages = state.content.list_all_stages().await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(
        stages.into_iter().map(StageDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/stages/{id}",
    tag = "Content",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Stage ID")),
    responses(
        (status = 200, description = "Stage", body = ApiResponse<StageDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_stage(
    State(state): State<ContentHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<StageDto> {
    let stage = state.content.get_stage(id).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(StageDto::from(stage))))
}

#[utoipa::path(
    post,
    path = "/api/v1/stages",
    tag = "Content",
    security(("bearer_auth" = [])),
    request_body = CreateStageRequest,
    responses(
        (status = 201, description = "Stage created", body = ApiResponse<StageDto>),
        (status = 404, description = "Module not found"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_stage(
    State(state): State<ContentHandlerState>,
    ValidatedJson(request): ValidatedJson<CreateStageRequest>,
) -> Created<StageDto> {
    let dto = CreateStageDto {
        module_id: request.module_id,
        title: request.title,
        description: request.description,
        content: content_text(request.content),
        order_index: request.order_index,
        prerequisite_stage_id: request.prerequisite_stage_id,
        min_time_minutes: request.min_time_minutes,
    };
    let stage = state.content.create_stage(dto).await.map_err(api_error)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(StageDto::from(stage))),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/stages/{id}",
    tag = "Content",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Stage ID")),
    request_body = UpdateStageRequest,
    responses(
        (status = 200, description = "Stage updated", body = ApiResponse<StageDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_stage(
    State(state): State<ContentHandlerState>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateStageRequest>,
) -> ApiResult<StageDto> {
    let dto = UpdateStageDto {
        title: request.title,
        description: request.description,
        content: content_text(request.content),
        order_index: request.order_index,
        prerequisite_stage_id: request.prerequisite_stage_id,
        min_time_minutes: request.min_time_minutes,
        is_active: request.is_active,
    };
    let stage = state.content.update_stage(id, dto).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(StageDto::from(stage))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/stages/{id}",
    tag = "Content",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Stage ID")),
    responses(
        (status = 200, description = "Stage deleted with its progress"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_stage(
    State(state): State<ContentHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<()> {
    state.content.delete_stage(id).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(())))
}
