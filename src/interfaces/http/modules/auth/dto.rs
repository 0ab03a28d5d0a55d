//! Authentication DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::interfaces::http::modules::users::UserDto;

/// The caller's account and resolved permissions
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: UserDto,
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 255, message = "first_name must be 1-255 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 255, message = "last_name must be 1-255 characters"))]
    pub last_name: Option<String>,
}
