/// Profile data received from the identity provider on login.
///
/// Upserting never touches `role` or `is_active` of an existing user.
#[derive(Debug, Clone)]
pub struct UpsertUserDto {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
}
