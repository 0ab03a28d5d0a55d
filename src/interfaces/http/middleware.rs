//! Authentication and authorization middleware for Axum
//!
//! `auth_middleware` verifies the identity-provider token and stores an
//! [`AuthenticatedUser`] in the request extensions. The two gates run after
//! it on individual route groups:
//!
//! - [`require_role`] checks membership of the stored user's role in a
//!   fixed set;
//! - [`require_permission`] runs the permission resolver for one
//!   permission.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, warn};

use super::common::{api_error, ApiResponse};
use crate::application::{PermissionService, UserService};
use crate::domain::{DomainError, Permission, UserRole};
use crate::infrastructure::crypto::jwt::{verify_token, JwtConfig, TokenClaims};

/// Authentication error types
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    InsufficientRole,
    PermissionRequired(Permission),
}

/// State for `auth_middleware`
#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
}

/// Caller identity taken from a verified token
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub claims: TokenClaims,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            claims,
        }
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| auth_error_response(AuthError::MissingToken))
    }
}

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Bearer-token authentication middleware
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let Some(auth_header) = auth_header else {
        return auth_error_response(AuthError::MissingToken);
    };

    let Some(token) = extract_token(auth_header) else {
        return auth_error_response(AuthError::InvalidToken);
    };

    match verify_token(token, &auth_state.jwt_config) {
        Ok(claims) => {
            let user = AuthenticatedUser::from_claims(claims);
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            debug!(error = %e, "Token rejected");
            auth_error_response(AuthError::InvalidToken)
        }
    }
}

// ── Role-membership gate ────────────────────────────────────────

/// Allowed roles for one route group
#[derive(Clone)]
pub struct RoleGate {
    pub users: Arc<UserService>,
    pub allowed: &'static [UserRole],
}

/// Role-membership gate. A caller without a stored account, or whose role
/// is outside `allowed`, gets 403.
pub async fn require_role(
    State(gate): State<RoleGate>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(user_id) = caller_id(&request) else {
        return auth_error_response(AuthError::MissingToken);
    };

    match gate.users.get_user(&user_id).await {
        Ok(user) if user.has_role(gate.allowed) => next.run(request).await,
        Ok(user) => {
            warn!(user_id = %user.id, role = %user.role, "Role gate denied");
            auth_error_response(AuthError::InsufficientRole)
        }
        Err(DomainError::NotFound { .. }) => auth_error_response(AuthError::InsufficientRole),
        Err(e) => api_error(e).into_response(),
    }
}

// ── Permission gate ─────────────────────────────────────────────

/// Required permission for one route group
#[derive(Clone)]
pub struct PermissionGate {
    pub permissions: Arc<PermissionService>,
    pub permission: Permission,
}

/// Permission gate backed by the resolver.
pub async fn require_permission(
    State(gate): State<PermissionGate>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(user_id) = caller_id(&request) else {
        return auth_error_response(AuthError::MissingToken);
    };

    match gate
        .permissions
        .has_permission(&user_id, gate.permission)
        .await
    {
        Ok(true) => next.run(request).await,
        Ok(false) => {
            warn!(user_id = %user_id, permission = %gate.permission, "Permission gate denied");
            auth_error_response(AuthError::PermissionRequired(gate.permission))
        }
        Err(e) => api_error(e).into_response(),
    }
}

fn caller_id(request: &Request<Body>) -> Option<String> {
    request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|u| u.user_id.clone())
}

fn auth_error_response(error: AuthError) -> Response {
    let (status, message) = match error {
        AuthError::MissingToken => (
            StatusCode::UNAUTHORIZED,
            "Missing authentication token".to_string(),
        ),
        AuthError::InvalidToken => (
            StatusCode::UNAUTHORIZED,
            "Invalid authentication token".to_string(),
        ),
        AuthError::InsufficientRole => {
            (StatusCode::FORBIDDEN, "Insufficient permissions".to_string())
        }
        AuthError::PermissionRequired(p) => {
            (StatusCode::FORBIDDEN, format!("Permission '{}' required", p))
        }
    };

    (status, Json(ApiResponse::<()>::error(message))).into_response()
}
