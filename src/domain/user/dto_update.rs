use super::UserRole;

/// Partial user update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserDto {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}
