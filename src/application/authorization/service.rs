//! Permission resolution and role/override administration

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::domain::{
    default_role_permissions, resolve, DomainError, DomainResult, NewUserOverride, Permission,
    RepositoryProvider, RolePermission, UserPermission, UserRole,
};

/// Input for creating or replacing a user override.
#[derive(Debug, Clone)]
pub struct SetOverride {
    pub permission: Permission,
    pub is_granted: bool,
    pub reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

pub struct PermissionService {
    repos: Arc<dyn RepositoryProvider>,
}

impl PermissionService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    // ── Checks ──────────────────────────────────────────────────

    /// Does `user_id` hold `permission` right now?
    ///
    /// Unknown users are denied. An override in effect wins over the role
    /// default in both directions.
    pub async fn has_permission(&self, user_id: &str, permission: Permission) -> DomainResult<bool> {
        let Some(user) = self.repos.users().get_user_by_id(user_id).await? else {
            record_check(permission, false);
            return Ok(false);
        };

        let role_grants = self.repos.permissions().role_grants(user.role, permission).await?;
        let now = Utc::now();
        let user_override = self
            .repos
            .permissions()
            .user_override(user_id, permission)
            .await?
            .filter(|o| o.is_in_effect(now))
            .map(|o| o.is_granted);

        let granted = resolve(role_grants, user_override);
        debug!(
            user_id,
            role = %user.role,
            permission = %permission,
            role_grants,
            ?user_override,
            granted,
            "Permission check"
        );
        record_check(permission, granted);
        Ok(granted)
    }

    /// The resolver applied to every permission, in canonical order.
    pub async fn effective_permissions(&self, user_id: &str) -> DomainResult<Vec<Permission>> {
        let Some(user) = self.repos.users().get_user_by_id(user_id).await? else {
            return Err(DomainError::not_found("User", "id", user_id));
        };

        let role_rows = self.repos.permissions().role_permissions(user.role).await?;
        let now = Utc::now();
        let overrides = self.repos.permissions().user_overrides(user_id).await?;

        Ok(Permission::ALL
            .into_iter()
            .filter(|p| {
                let role_grants = role_rows.iter().any(|r| r.permission == *p && r.is_granted);
                let user_override = overrides
                    .iter()
                    .find(|o| o.permission == *p && o.is_in_effect(now))
                    .map(|o| o.is_granted);
                resolve(role_grants, user_override)
            })
            .collect())
    }

    // ── Role defaults ───────────────────────────────────────────

    pub async fn role_permissions(&self, role: UserRole) -> DomainResult<Vec<RolePermission>> {
        self.repos.permissions().role_permissions(role).await
    }

    /// Replace the granted set of `role`; omitted permissions are revoked.
    pub async fn replace_role_permissions(
        &self,
        role: UserRole,
        permissions: &[Permission],
    ) -> DomainResult<Vec<RolePermission>> {
        let mut unique = permissions.to_vec();
        unique.sort();
        unique.dedup();

        self.repos
            .permissions()
            .replace_role_permissions(role, &unique)
            .await?;
        info!(role = %role, count = unique.len(), "Role permissions replaced");

        self.repos.permissions().role_permissions(role).await
    }

    /// Wipe every role row and write the built-in defaults.
    pub async fn seed_default_permissions(&self) -> DomainResult<()> {
        let table: Vec<(UserRole, Vec<Permission>)> = UserRole::ALL
            .into_iter()
            .map(|role| (role, default_role_permissions(role).to_vec()))
            .collect();

        self.repos.permissions().reset_role_permissions(&table).await?;
        info!(
            rows = table.iter().map(|(_, p)| p.len()).sum::<usize>(),
            "Default role permissions seeded"
        );
        Ok(())
    }

    // ── User overrides ──────────────────────────────────────────

    pub async fn user_overrides(&self, user_id: &str) -> DomainResult<Vec<UserPermission>> {
        self.ensure_user(user_id).await?;
        self.repos.permissions().user_overrides(user_id).await
    }

    pub async fn set_user_override(
        &self,
        user_id: &str,
        input: SetOverride,
        granted_by: Option<&str>,
    ) -> DomainResult<UserPermission> {
        self.ensure_user(user_id).await?;
        if input.expires_at.is_some_and(|at| at <= Utc::now()) {
            return Err(DomainError::Validation(
                "expires_at must be in the future".into(),
            ));
        }

        let row = self
            .repos
            .permissions()
            .upsert_user_override(NewUserOverride {
                user_id: user_id.to_string(),
                permission: input.permission,
                is_granted: input.is_granted,
                granted_by: granted_by.map(str::to_string),
                reason: input.reason,
                expires_at: input.expires_at,
            })
            .await?;

        info!(
            user_id,
            permission = %row.permission,
            granted = row.is_granted,
            granted_by = ?row.granted_by,
            "User permission override set"
        );
        Ok(row)
    }

    pub async fn remove_user_override(&self, user_id: &str, permission: Permission) -> DomainResult<()> {
        let removed = self
            .repos
            .permissions()
            .delete_user_override(user_id, permission)
            .await?;
        if !removed {
            return Err(DomainError::not_found(
                "UserPermission",
                "permission",
                permission,
            ));
        }
        info!(user_id, permission = %permission, "User permission override removed");
        Ok(())
    }

    async fn ensure_user(&self, user_id: &str) -> DomainResult<()> {
        match self.repos.users().get_user_by_id(user_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found("User", "id", user_id)),
        }
    }
}

fn record_check(permission: Permission, granted: bool) {
    metrics::counter!(
        "permission_checks_total",
        "permission" => permission.as_str(),
        "outcome" => if granted { "granted" } else { "denied" }
    )
    .increment(1);
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{UpdateUserDto, UpsertUserDto};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use chrono::Duration;

    async fn setup() -> (Arc<InMemoryRepositoryProvider>, PermissionService) {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let service = PermissionService::new(repos.clone());
        service.seed_default_permissions().await.unwrap();
        (repos, service)
    }

    async fn user_with_role(repos: &InMemoryRepositoryProvider, id: &str, role: UserRole) {
        use crate::domain::UserRepository;
        repos
            .upsert_user(UpsertUserDto {
                id: id.into(),
                email: None,
                first_name: None,
                last_name: None,
                profile_image_url: None,
            })
            .await
            .unwrap();
        repos
            .update_user(
                id,
                UpdateUserDto {
                    role: Some(role),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    fn set(permission: Permission, is_granted: bool) -> SetOverride {
        SetOverride {
            permission,
            is_granted,
            reason: None,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn seeded_defaults_hold_for_every_role() {
        let (repos, service) = setup().await;
        for role in UserRole::ALL {
            let id = format!("user-{}", role);
            user_with_role(&repos, &id, role).await;
            for p in Permission::ALL {
                let expected = default_role_permissions(role).contains(&p);
                assert_eq!(
                    service.has_permission(&id, p).await.unwrap(),
                    expected,
                    "{role} / {p}"
                );
            }
        }
    }

    #[tokio::test]
    async fn unknown_user_is_denied() {
        let (_, service) = setup().await;
        assert!(!service
            .has_permission("ghost", Permission::ManageUsers)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn revoking_override_beats_role_grant() {
        let (repos, service) = setup().await;
        user_with_role(&repos, "t-1", UserRole::Teacher).await;
        service
            .replace_role_permissions(
                UserRole::Teacher,
                &[Permission::ManageContent, Permission::ViewAnalytics],
            )
            .await
            .unwrap();
        service
            .set_user_override("t-1", set(Permission::ViewAnalytics, false), Some("admin"))
            .await
            .unwrap();

        assert!(service.has_permission("t-1", Permission::ManageContent).await.unwrap());
        assert!(!service.has_permission("t-1", Permission::ViewAnalytics).await.unwrap());
    }

    #[tokio::test]
    async fn granting_override_adds_a_single_permission() {
        let (repos, service) = setup().await;
        user_with_role(&repos, "s-1", UserRole::Student).await;
        service
            .set_user_override("s-1", set(Permission::ManageQuotes, true), None)
            .await
            .unwrap();

        assert!(service.has_permission("s-1", Permission::ManageQuotes).await.unwrap());
        assert!(!service.has_permission("s-1", Permission::ManageContent).await.unwrap());
        assert_eq!(
            service.effective_permissions("s-1").await.unwrap(),
            vec![Permission::ManageQuotes]
        );
    }

    #[tokio::test]
    async fn replacing_role_set_revokes_omitted_permissions() {
        let (repos, service) = setup().await;
        user_with_role(&repos, "t-1", UserRole::Teacher).await;
        service
            .replace_role_permissions(
                UserRole::Teacher,
                &[Permission::ManageContent, Permission::ManageQuizzes],
            )
            .await
            .unwrap();
        let rows = service
            .replace_role_permissions(UserRole::Teacher, &[Permission::GradeAssignments])
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert!(!service.has_permission("t-1", Permission::ManageContent).await.unwrap());
        assert!(!service.has_permission("t-1", Permission::ManageQuizzes).await.unwrap());
        assert!(service.has_permission("t-1", Permission::GradeAssignments).await.unwrap());
    }

    #[tokio::test]
    async fn expired_override_falls_back_to_role() {
        let (repos, service) = setup().await;
        user_with_role(&repos, "t-1", UserRole::Teacher).await;
        service
            .set_user_override(
                "t-1",
                SetOverride {
                    expires_at: Some(Utc::now() + Duration::milliseconds(20)),
                    ..set(Permission::ManageContent, false)
                },
                None,
            )
            .await
            .unwrap();
        assert!(!service.has_permission("t-1", Permission::ManageContent).await.unwrap());

        tokio::time::sleep(std::time::Duration::from_millis(40)).await;
        assert!(service.has_permission("t-1", Permission::ManageContent).await.unwrap());
    }

    #[tokio::test]
    async fn reseeding_restores_defaults() {
        let (repos, service) = setup().await;
        user_with_role(&repos, "t-1", UserRole::Teacher).await;
        service
            .replace_role_permissions(UserRole::Teacher, &[])
            .await
            .unwrap();
        assert!(!service.has_permission("t-1", Permission::ManageContent).await.unwrap());

        service.seed_default_permissions().await.unwrap();
        assert!(service.has_permission("t-1", Permission::ManageContent).await.unwrap());
        assert_eq!(
            service.role_permissions(UserRole::SuperAdmin).await.unwrap().len(),
            Permission::ALL.len()
        );
        assert!(service
            .role_permissions(UserRole::Student)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn removing_missing_override_is_not_found() {
        let (repos, service) = setup().await;
        user_with_role(&repos, "s-1", UserRole::Student).await;
        let err = service
            .remove_user_override("s-1", Permission::BackupData)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn override_for_unknown_user_is_rejected() {
        let (_, service) = setup().await;
        let err = service
            .set_user_override("ghost", set(Permission::BackupData, true), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
