use async_trait::async_trait;

use super::{GetUserDto, UpdateUserDto, UpsertUserDto, User};
use crate::shared::errors::DomainResult;
use crate::shared::PaginatedResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new student or refresh the profile of an existing user,
    /// stamping `last_login_at`.
    async fn upsert_user(&self, dto: UpsertUserDto) -> DomainResult<User>;

    async fn list_users(&self, dto: GetUserDto) -> DomainResult<PaginatedResult<User>>;
    async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<User>>;

    async fn update_user(&self, id: &str, dto: UpdateUserDto) -> DomainResult<Option<User>>;
    async fn delete_user(&self, id: &str) -> DomainResult<()>;
}
