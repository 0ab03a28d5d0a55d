//! API Router with Swagger UI
//!
//! Route groups follow their gate: authenticated-only, role-gated and
//! permission-gated groups are built separately, merged, and then wrapped
//! in `auth_middleware` so token verification always runs first.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::common::{ApiResponse, PaginatedResponse};
use super::middleware::{
    auth_middleware, require_permission, require_role, AuthState, PermissionGate, RoleGate,
};
use super::modules::{
    auth, content, health, metrics as metrics_module, permissions, progress, request_id, users,
};
use crate::application::{ContentService, PermissionService, ProgressService, UserService};
use crate::domain::{Permission, RepositoryProvider, UserRole};
use crate::infrastructure::crypto::jwt::JwtConfig;

const SUPER_ADMIN: &[UserRole] = &[UserRole::SuperAdmin];
const CONTENT_AUTHORS: &[UserRole] = &[UserRole::SuperAdmin, UserRole::Teacher];

/// Everything the HTTP layer needs. Handlers extract their own slice of it
/// through `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub users: Arc<UserService>,
    pub permissions: Arc<PermissionService>,
    pub content: Arc<ContentService>,
    pub progress: Arc<ProgressService>,
    pub auth: AuthState,
    pub started_at: Arc<Instant>,
}

impl ApiState {
    pub fn new(repos: Arc<dyn RepositoryProvider>, jwt_config: JwtConfig) -> Self {
        Self {
            users: Arc::new(UserService::new(repos.clone())),
            permissions: Arc::new(PermissionService::new(repos.clone())),
            content: Arc::new(ContentService::new(repos.clone())),
            progress: Arc::new(ProgressService::new(repos.clone())),
            auth: AuthState { jwt_config },
            started_at: Arc::new(Instant::now()),
            repos,
        }
    }

    fn role_gate(&self, allowed: &'static [UserRole]) -> RoleGate {
        RoleGate {
            users: self.users.clone(),
            allowed,
        }
    }

    fn permission_gate(&self, permission: Permission) -> PermissionGate {
        PermissionGate {
            permissions: self.permissions.clone(),
            permission,
        }
    }
}

// -- FromRef implementations so each handler keeps its own State<T> extractor --

impl FromRef<ApiState> for health::HealthState {
    fn from_ref(s: &ApiState) -> Self {
        health::HealthState {
            repos: s.repos.clone(),
            started_at: s.started_at.clone(),
        }
    }
}

impl FromRef<ApiState> for auth::AuthHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        auth::AuthHandlerState {
            users: s.users.clone(),
            permissions: s.permissions.clone(),
        }
    }
}

impl FromRef<ApiState> for users::UserHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        users::UserHandlerState {
            users: s.users.clone(),
        }
    }
}

impl FromRef<ApiState> for permissions::PermissionHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        permissions::PermissionHandlerState {
            permissions: s.permissions.clone(),
        }
    }
}

impl FromRef<ApiState> for content::ContentHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        content::ContentHandlerState {
            content: s.content.clone(),
        }
    }
}

impl FromRef<ApiState> for progress::ProgressHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        progress::ProgressHandlerState {
            progress: s.progress.clone(),
        }
    }
}

impl FromRef<ApiState> for AuthState {
    fn from_ref(s: &ApiState) -> Self {
        s.auth.clone()
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token issued by the identity provider"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Auth
        auth::sync_user,
        auth::get_current_user,
        auth::update_profile,
        // Users
        users::list_users,
        users::update_user,
        users::delete_user,
        users::update_user_role,
        // Permissions
        permissions::list_permissions,
        permissions::get_role_permissions,
        permissions::replace_role_permissions,
        permissions::list_user_permissions,
        permissions::set_user_permission,
        permissions::remove_user_permission,
        permissions::check_permission,
        // Content
        content::list_modules,
        content::get_module,
        content::list_module_stages,
        content::create_module,
        content::update_module,
        content::delete_module,
        content::list_all_stages,
        content::get_stage,
        content::create_stage,
        content::update_stage,
        content::delete_stage,
        // Progress
        progress::get_stage_progress,
        progress::record_progress,
        progress::complete_stage,
        progress::validate_interaction,
        progress::module_progress,
    ),
    components(
        schemas(
            ApiResponse<String>,
            PaginatedResponse<users::UserDto>,
            health::HealthResponse,
            health::ComponentHealth,
            auth::MeResponse,
            auth::UpdateProfileRequest,
            users::UserDto,
            users::UpdateUserRequest,
            users::UpdateRoleRequest,
            permissions::RolePermissionDto,
            permissions::UserPermissionDto,
            permissions::ReplaceRolePermissionsRequest,
            permissions::SetUserPermissionRequest,
            permissions::PermissionCheckResponse,
            content::ModuleDto,
            content::StageDto,
            content::CreateModuleRequest,
            content::UpdateModuleRequest,
            content::CreateStageRequest,
            content::UpdateStageRequest,
            progress::StageProgressDto,
            progress::StageProgressView,
            progress::RecordProgressRequest,
            progress::ValidateInteractionRequest,
            progress::ValidateInteractionResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and database reachability"),
        (name = "Authentication", description = "First-login sync and the caller's own account"),
        (name = "Users", description = "Account administration"),
        (name = "Permissions", description = "Role defaults, per-user overrides and checks"),
        (name = "Content", description = "Learning modules and their ordered stages"),
        (name = "Progress", description = "Per-learner stage progress and interaction validation"),
    ),
    info(
        title = "LMS Service API",
        version = "0.1.0",
        description = "Role/permission resolution and stage progress tracking for a learning platform"
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes.
///
/// `metrics` is `None` when no Prometheus recorder is installed (tests,
/// `metrics.enabled = false`); `/metrics` is then not mounted.
pub fn create_api_router(state: ApiState, metrics: Option<PrometheusHandle>) -> Router {
    // Any authenticated caller
    let authenticated_routes = Router::new()
        .route("/auth/sync", post(auth::sync_user))
        .route("/auth/me", get(auth::get_current_user))
        .route("/profile", patch(auth::update_profile))
        .route(
            "/permissions/check/{permission}",
            get(permissions::check_permission),
        )
        .route("/modules", get(content::list_modules))
        .route("/modules/{id}", get(content::get_module))
        .route("/modules/{id}/stages", get(content::list_module_stages))
        .route("/stages/{id}", get(content::get_stage))
        .route(
            "/stages/{id}/progress",
            get(progress::get_stage_progress).post(progress::record_progress),
        )
        .route("/stages/{id}/complete", post(progress::complete_stage))
        .route("/stages/{id}/validate", post(progress::validate_interaction))
        .route("/progress/modules/{id}", get(progress::module_progress));

    // role: super_admin
    let super_admin_routes = Router::new()
        .route("/users", get(users::list_users))
        .route(
            "/users/{id}",
            patch(users::update_user).delete(users::delete_user),
        )
        .route("/admin/users/{id}/role", put(users::update_user_role))
        .route(
            "/admin/roles/{role}/permissions",
            get(permissions::get_role_permissions).put(permissions::replace_role_permissions),
        )
        .route(
            "/admin/users/{id}/permissions",
            get(permissions::list_user_permissions).post(permissions::set_user_permission),
        )
        .route(
            "/admin/users/{id}/permissions/{permission}",
            delete(permissions::remove_user_permission),
        )
        .route("/modules", post(content::create_module))
        .route(
            "/modules/{id}",
            put(content::update_module).delete(content::delete_module),
        )
        .route("/stages/all", get(content::list_all_stages))
        .route_layer(middleware::from_fn_with_state(
            state.role_gate(SUPER_ADMIN),
            require_role,
        ));

    // role: super_admin or teacher
    let author_routes = Router::new()
        .route("/stages", post(content::create_stage))
        .route(
            "/stages/{id}",
            patch(content::update_stage).delete(content::delete_stage),
        )
        .route_layer(middleware::from_fn_with_state(
            state.role_gate(CONTENT_AUTHORS),
            require_role,
        ));

    // permission: manage_users
    let manage_users_routes = Router::new()
        .route("/admin/permissions", get(permissions::list_permissions))
        .route_layer(middleware::from_fn_with_state(
            state.permission_gate(Permission::ManageUsers),
            require_permission,
        ));

    let api_routes = Router::new()
        .merge(authenticated_routes)
        .merge(super_admin_routes)
        .merge(author_routes)
        .merge(manage_users_routes)
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ));

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    let mut router = Router::new()
        .merge(swagger_routes)
        .route("/health", get(health::health_check))
        .nest("/api/v1", api_routes);

    if let Some(handle) = metrics {
        router = router.route(
            "/metrics",
            get(metrics_module::prometheus_metrics)
                .with_state(metrics_module::MetricsState { handle }),
        );
    }

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .layer(middleware::from_fn(metrics_module::http_metrics_middleware))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
