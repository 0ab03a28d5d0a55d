//! User management service, application-layer orchestration
//!
//! HTTP handlers are thin wrappers that delegate to this service.

use std::sync::Arc;

use tracing::info;

use crate::domain::{
    DomainError, DomainResult, GetUserDto, RepositoryProvider, UpdateUserDto, UpsertUserDto, User,
    UserRole,
};
use crate::shared::PaginatedResult;

pub struct UserService {
    repos: Arc<dyn RepositoryProvider>,
}

impl UserService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    // ── Login sync ──────────────────────────────────────────────

    /// Create the account on first login, refresh the profile afterwards.
    /// New accounts are students; role and active flag are never touched.
    pub async fn upsert_user(&self, dto: UpsertUserDto) -> DomainResult<User> {
        if dto.id.trim().is_empty() {
            return Err(DomainError::Validation("User id must not be empty".into()));
        }
        let user = self.repos.users().upsert_user(dto).await?;
        info!(user_id = %user.id, role = %user.role, "User synced from identity provider");
        Ok(user)
    }

    // ── Queries ─────────────────────────────────────────────────

    pub async fn list_users(&self, dto: GetUserDto) -> DomainResult<PaginatedResult<User>> {
        self.repos.users().list_users(dto).await
    }

    pub async fn get_user(&self, id: &str) -> DomainResult<User> {
        self.repos
            .users()
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", id))
    }

    // ── Commands (mutations) ────────────────────────────────────

    pub async fn update_profile(
        &self,
        id: &str,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> DomainResult<User> {
        self.update(
            id,
            UpdateUserDto {
                first_name,
                last_name,
                ..Default::default()
            },
        )
        .await
    }

    pub async fn update_role(&self, id: &str, role: UserRole) -> DomainResult<User> {
        let user = self
            .update(
                id,
                UpdateUserDto {
                    role: Some(role),
                    ..Default::default()
                },
            )
            .await?;
        info!(user_id = %id, role = %role, "User role changed");
        Ok(user)
    }

    /// Soft (de)activation.
    pub async fn set_active(&self, id: &str, is_active: bool) -> DomainResult<User> {
        let user = self
            .update(
                id,
                UpdateUserDto {
                    is_active: Some(is_active),
                    ..Default::default()
                },
            )
            .await?;
        info!(user_id = %id, is_active, "User activation changed");
        Ok(user)
    }

    /// Admin edit combining any of the above fields.
    pub async fn update(&self, id: &str, dto: UpdateUserDto) -> DomainResult<User> {
        self.repos
            .users()
            .update_user(id, dto)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", id))
    }

    /// Hard delete; overrides and progress go with the user.
    pub async fn delete_user(&self, id: &str) -> DomainResult<()> {
        self.repos.users().delete_user(id).await?;
        info!(user_id = %id, "User deleted");
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    fn service() -> UserService {
        UserService::new(Arc::new(InMemoryRepositoryProvider::new()))
    }

    fn claims(id: &str) -> UpsertUserDto {
        UpsertUserDto {
            id: id.into(),
            email: Some("learner@school.test".into()),
            first_name: Some("Lin".into()),
            last_name: Some("Chen".into()),
            profile_image_url: None,
        }
    }

    #[tokio::test]
    async fn first_login_creates_a_student() {
        let svc = service();
        let user = svc.upsert_user(claims("sub-1")).await.unwrap();
        assert_eq!(user.role, UserRole::Student);
        assert!(user.is_active);
        assert_eq!(user.display_name(), "Lin Chen");
    }

    #[tokio::test]
    async fn relogin_preserves_promoted_role() {
        let svc = service();
        svc.upsert_user(claims("sub-1")).await.unwrap();
        svc.update_role("sub-1", UserRole::Teacher).await.unwrap();

        let user = svc.upsert_user(claims("sub-1")).await.unwrap();
        assert_eq!(user.role, UserRole::Teacher);
    }

    #[tokio::test]
    async fn empty_subject_is_rejected() {
        let err = service().upsert_user(claims(" ")).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn deactivate_then_profile_update() {
        let svc = service();
        svc.upsert_user(claims("sub-1")).await.unwrap();
        let user = svc.set_active("sub-1", false).await.unwrap();
        assert!(!user.is_active);

        let user = svc
            .update_profile("sub-1", Some("Mei".into()), None)
            .await
            .unwrap();
        assert_eq!(user.first_name.as_deref(), Some("Mei"));
        assert_eq!(user.last_name.as_deref(), Some("Chen"));
        assert!(!user.is_active);
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let svc = service();
        assert!(matches!(
            svc.get_user("nope").await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            svc.update_role("nope", UserRole::Teacher).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            svc.delete_user("nope").await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
