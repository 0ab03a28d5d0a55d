//! In-memory repository provider for development and testing
//!
//! Mirrors the relational store's uniqueness rules: one role row per
//! `(role, permission)`, one override per `(user_id, permission)`, one
//! progress row per `(user_id, stage_id)`. Compound writes take the
//! relevant `DashMap` shard lock through the entry API so concurrent
//! callers never create duplicates.

use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::{
    ContentRepository, CreateModuleDto, CreateStageDto, DomainError, DomainResult, GetUserDto,
    LearningModule, NewUserOverride, Permission, PermissionRepository, ProgressRepository,
    ProgressUpdate, RepositoryProvider, RolePermission, Stage, StageProgress, UpdateModuleDto,
    UpdateStageDto, UpdateUserDto, UpsertUserDto, User, UserPermission, UserRepository, UserRole,
};
use crate::shared::PaginatedResult;

/// All four repositories over `DashMap`s.
pub struct InMemoryRepositoryProvider {
    users: DashMap<String, User>,
    // role rows are swapped as a whole so a reader never sees a half-replaced role
    role_permissions: DashMap<UserRole, Vec<RolePermission>>,
    user_permissions: DashMap<(String, Permission), UserPermission>,
    modules: DashMap<i32, LearningModule>,
    stages: DashMap<i32, Stage>,
    progress: DashMap<(String, i32), StageProgress>,
    counter: AtomicI32,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            role_permissions: DashMap::new(),
            user_permissions: DashMap::new(),
            modules: DashMap::new(),
            stages: DashMap::new(),
            progress: DashMap::new(),
            counter: AtomicI32::new(1),
        }
    }

    fn next_id(&self) -> i32 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    fn role_rows(
        &self,
        role: UserRole,
        permissions: &[Permission],
        now: DateTime<Utc>,
    ) -> Vec<RolePermission> {
        permissions
            .iter()
            .map(|&permission| RolePermission {
                id: self.next_id(),
                role,
                permission,
                is_granted: true,
                created_at: now,
            })
            .collect()
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RepositoryProvider for InMemoryRepositoryProvider {
    fn users(&self) -> &dyn UserRepository {
        self
    }

    fn permissions(&self) -> &dyn PermissionRepository {
        self
    }

    fn content(&self) -> &dyn ContentRepository {
        self
    }

    fn progress(&self) -> &dyn ProgressRepository {
        self
    }

    async fn ping(&self) -> DomainResult<()> {
        Ok(())
    }
}

// ── Users ───────────────────────────────────────────────────────

#[async_trait]
impl UserRepository for InMemoryRepositoryProvider {
    async fn upsert_user(&self, dto: UpsertUserDto) -> DomainResult<User> {
        let now = Utc::now();
        let mut entry = self.users.entry(dto.id.clone()).or_insert_with(|| User {
            id: dto.id.clone(),
            email: None,
            first_name: None,
            last_name: None,
            profile_image_url: None,
            role: UserRole::Student,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        });
        let user = entry.value_mut();
        user.email = dto.email;
        user.first_name = dto.first_name;
        user.last_name = dto.last_name;
        user.profile_image_url = dto.profile_image_url;
        user.last_login_at = Some(now);
        user.updated_at = now;
        Ok(user.clone())
    }

    async fn list_users(&self, dto: GetUserDto) -> DomainResult<PaginatedResult<User>> {
        let page = dto.page.unwrap_or(1).max(1);
        let page_size = dto.page_size.unwrap_or(20).clamp(1, 100);
        let search = dto.search.as_deref().map(str::to_lowercase);

        let mut users: Vec<User> = self
            .users
            .iter()
            .map(|e| e.value().clone())
            .filter(|u| dto.role.map_or(true, |r| u.role == r))
            .filter(|u| match search {
                Some(ref needle) => [&u.email, &u.first_name, &u.last_name]
                    .iter()
                    .any(|f| f.as_deref().is_some_and(|v| v.to_lowercase().contains(needle))),
                None => true,
            })
            .collect();

        match dto.sort_by.as_deref() {
            Some("email") => users.sort_by(|a, b| a.email.cmp(&b.email)),
            Some("last_name") => users.sort_by(|a, b| a.last_name.cmp(&b.last_name)),
            Some("role") => users.sort_by_key(|u| u.role.as_str()),
            _ => users.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }

        let total = users.len() as u64;
        let items = users
            .into_iter()
            .skip(((page - 1) * page_size) as usize)
            .take(page_size as usize)
            .collect();

        Ok(PaginatedResult::new(items, total, page, page_size))
    }

    async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn update_user(&self, id: &str, dto: UpdateUserDto) -> DomainResult<Option<User>> {
        let Some(mut user) = self.users.get_mut(id) else {
            return Ok(None);
        };
        if let Some(first_name) = dto.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = dto.last_name {
            user.last_name = Some(last_name);
        }
        if let Some(role) = dto.role {
            user.role = role;
        }
        if let Some(is_active) = dto.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: &str) -> DomainResult<()> {
        self.users
            .remove(id)
            .ok_or_else(|| DomainError::not_found("User", "id", id))?;
        // mirror ON DELETE CASCADE
        self.user_permissions.retain(|(user_id, _), _| user_id != id);
        self.progress.retain(|(user_id, _), _| user_id != id);
        Ok(())
    }
}

// ── Permissions ─────────────────────────────────────────────────

#[async_trait]
impl PermissionRepository for InMemoryRepositoryProvider {
    async fn role_grants(&self, role: UserRole, permission: Permission) -> DomainResult<bool> {
        Ok(self.role_permissions.get(&role).is_some_and(|rows| {
            rows.iter()
                .any(|r| r.permission == permission && r.is_granted)
        }))
    }

    async fn role_permissions(&self, role: UserRole) -> DomainResult<Vec<RolePermission>> {
        Ok(self
            .role_permissions
            .get(&role)
            .map(|rows| rows.clone())
            .unwrap_or_default())
    }

    async fn replace_role_permissions(
        &self,
        role: UserRole,
        permissions: &[Permission],
    ) -> DomainResult<()> {
        let mut unique = permissions.to_vec();
        unique.sort();
        unique.dedup();
        let rows = self.role_rows(role, &unique, Utc::now());
        self.role_permissions.insert(role, rows);
        Ok(())
    }

    async fn reset_role_permissions(
        &self,
        table: &[(UserRole, Vec<Permission>)],
    ) -> DomainResult<()> {
        let now = Utc::now();
        let fresh: Vec<(UserRole, Vec<RolePermission>)> = table
            .iter()
            .map(|(role, permissions)| (*role, self.role_rows(*role, permissions, now)))
            .collect();

        // Readers never observe an empty table.
        for (role, rows) in fresh {
            self.role_permissions.insert(role, rows);
        }
        self.role_permissions.retain(|role, _| table.iter().any(|(r, _)| r == role));
        Ok(())
    }

    async fn user_override(
        &self,
        user_id: &str,
        permission: Permission,
    ) -> DomainResult<Option<UserPermission>> {
        Ok(self
            .user_permissions
            .get(&(user_id.to_string(), permission))
            .map(|o| o.clone()))
    }

    async fn user_overrides(&self, user_id: &str) -> DomainResult<Vec<UserPermission>> {
        let mut overrides: Vec<UserPermission> = self
            .user_permissions
            .iter()
            .filter(|e| e.key().0 == user_id)
            .map(|e| e.value().clone())
            .collect();
        overrides.sort_by_key(|o| o.permission);
        Ok(overrides)
    }

    async fn upsert_user_override(&self, dto: NewUserOverride) -> DomainResult<UserPermission> {
        let key = (dto.user_id.clone(), dto.permission);
        let id = self
            .user_permissions
            .get(&key)
            .map(|o| o.id)
            .unwrap_or_else(|| self.next_id());
        let row = UserPermission {
            id,
            user_id: dto.user_id,
            permission: dto.permission,
            is_granted: dto.is_granted,
            granted_by: dto.granted_by,
            reason: dto.reason,
            expires_at: dto.expires_at,
            created_at: Utc::now(),
        };
        self.user_permissions.insert(key, row.clone());
        Ok(row)
    }

    async fn delete_user_override(
        &self,
        user_id: &str,
        permission: Permission,
    ) -> DomainResult<bool> {
        Ok(self
            .user_permissions
            .remove(&(user_id.to_string(), permission))
            .is_some())
    }
}

// ── Content ─────────────────────────────────────────────────────

#[async_trait]
impl ContentRepository for InMemoryRepositoryProvider {
    async fn list_modules(&self) -> DomainResult<Vec<LearningModule>> {
        let mut modules: Vec<LearningModule> = self
            .modules
            .iter()
            .filter(|m| m.is_active)
            .map(|m| m.value().clone())
            .collect();
        modules.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(modules)
    }

    async fn get_module(&self, id: i32) -> DomainResult<Option<LearningModule>> {
        Ok(self.modules.get(&id).map(|m| m.clone()))
    }

    async fn create_module(&self, dto: CreateModuleDto) -> DomainResult<LearningModule> {
        let now = Utc::now();
        let module = LearningModule {
            id: self.next_id(),
            title: dto.title,
            description: dto.description,
            is_active: true,
            created_by: dto.created_by,
            created_at: now,
            updated_at: now,
        };
        self.modules.insert(module.id, module.clone());
        Ok(module)
    }

    async fn update_module(
        &self,
        id: i32,
        dto: UpdateModuleDto,
    ) -> DomainResult<Option<LearningModule>> {
        let Some(mut module) = self.modules.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = dto.title {
            module.title = title;
        }
        if let Some(description) = dto.description {
            module.description = Some(description);
        }
        if let Some(is_active) = dto.is_active {
            module.is_active = is_active;
        }
        module.updated_at = Utc::now();
        Ok(Some(module.clone()))
    }

    async fn list_stages(&self, module_id: i32) -> DomainResult<Vec<Stage>> {
        let mut stages: Vec<Stage> = self
            .stages
            .iter()
            .filter(|s| s.module_id == module_id)
            .map(|s| s.value().clone())
            .collect();
        stages.sort_by_key(|s| (s.order_index, s.id));
        Ok(stages)
    }

    async fn list_all_stages(&self) -> DomainResult<Vec<Stage>> {
        let mut stages: Vec<Stage> = self.stages.iter().map(|s| s.value().clone()).collect();
        stages.sort_by_key(|s| (s.module_id, s.order_index, s.id));
        Ok(stages)
    }

    async fn get_stage(&self, id: i32) -> DomainResult<Option<Stage>> {
        Ok(self.stages.get(&id).map(|s| s.clone()))
    }

    async fn create_stage(&self, dto: CreateStageDto) -> DomainResult<Stage> {
        if !self.modules.contains_key(&dto.module_id) {
            return Err(DomainError::not_found("LearningModule", "id", dto.module_id));
        }
        let now = Utc::now();
        let stage = Stage {
            id: self.next_id(),
            module_id: dto.module_id,
            title: dto.title,
            description: dto.description,
            content: dto.content,
            order_index: dto.order_index,
            prerequisite_stage_id: dto.prerequisite_stage_id,
            min_time_minutes: dto.min_time_minutes,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.stages.insert(stage.id, stage.clone());
        Ok(stage)
    }

    async fn update_stage(&self, id: i32, dto: UpdateStageDto) -> DomainResult<Option<Stage>> {
        let Some(mut stage) = self.stages.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = dto.title {
            stage.title = title;
        }
        if let Some(description) = dto.description {
            stage.description = Some(description);
        }
        if let Some(content) = dto.content {
            stage.content = Some(content);
        }
        if let Some(order_index) = dto.order_index {
            stage.order_index = order_index;
        }
        if let Some(prerequisite) = dto.prerequisite_stage_id {
            stage.prerequisite_stage_id = Some(prerequisite);
        }
        if let Some(minutes) = dto.min_time_minutes {
            stage.min_time_minutes = Some(minutes);
        }
        if let Some(is_active) = dto.is_active {
            stage.is_active = is_active;
        }
        stage.updated_at = Utc::now();
        Ok(Some(stage.clone()))
    }

    async fn delete_stage(&self, id: i32) -> DomainResult<bool> {
        let removed = self.stages.remove(&id).is_some();
        if removed {
            self.progress.retain(|(_, stage_id), _| *stage_id != id);
        }
        Ok(removed)
    }
}

// ── Progress ────────────────────────────────────────────────────

#[async_trait]
impl ProgressRepository for InMemoryRepositoryProvider {
    async fn find(&self, user_id: &str, stage_id: i32) -> DomainResult<Option<StageProgress>> {
        Ok(self
            .progress
            .get(&(user_id.to_string(), stage_id))
            .map(|p| p.clone()))
    }

    async fn upsert_progress(
        &self,
        user_id: &str,
        stage_id: i32,
        update: &ProgressUpdate,
        now: DateTime<Utc>,
    ) -> DomainResult<StageProgress> {
        let key = (user_id.to_string(), stage_id);
        let row = match self.progress.entry(key) {
            Entry::Occupied(mut e) => {
                e.get_mut().apply(update, now);
                e.get().clone()
            }
            Entry::Vacant(e) => {
                let row = StageProgress::started(self.next_id(), user_id, stage_id, update, now);
                e.insert(row.clone());
                row
            }
        };
        Ok(row)
    }

    async fn mark_completed(
        &self,
        user_id: &str,
        stage_id: i32,
        now: DateTime<Utc>,
    ) -> DomainResult<StageProgress> {
        let key = (user_id.to_string(), stage_id);
        let row = match self.progress.entry(key) {
            Entry::Occupied(mut e) => {
                e.get_mut().complete(now);
                e.get().clone()
            }
            Entry::Vacant(e) => {
                let row = StageProgress::completed(self.next_id(), user_id, stage_id, now);
                e.insert(row.clone());
                row
            }
        };
        Ok(row)
    }

    async fn list_for_module(
        &self,
        user_id: &str,
        module_id: i32,
    ) -> DomainResult<Vec<StageProgress>> {
        let stage_ids: Vec<i32> = self
            .stages
            .iter()
            .filter(|s| s.module_id == module_id)
            .map(|s| s.id)
            .collect();
        let mut rows: Vec<StageProgress> = self
            .progress
            .iter()
            .filter(|p| p.user_id == user_id && stage_ids.contains(&p.stage_id))
            .map(|p| p.value().clone())
            .collect();
        rows.sort_by_key(|p| p.stage_id);
        Ok(rows)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str) -> UpsertUserDto {
        UpsertUserDto {
            id: id.into(),
            email: Some(format!("{}@school.test", id)),
            first_name: Some("Ada".into()),
            last_name: None,
            profile_image_url: None,
        }
    }

    #[tokio::test]
    async fn upsert_keeps_role_and_active_flag() {
        let repo = InMemoryRepositoryProvider::new();
        let user = repo.upsert_user(profile("u-1")).await.unwrap();
        assert_eq!(user.role, UserRole::Student);

        repo.update_user(
            "u-1",
            UpdateUserDto {
                role: Some(UserRole::Teacher),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let mut again = profile("u-1");
        again.first_name = Some("Grace".into());
        let user = repo.upsert_user(again).await.unwrap();

        assert_eq!(user.role, UserRole::Teacher);
        assert!(!user.is_active);
        assert_eq!(user.first_name.as_deref(), Some("Grace"));
        assert!(user.last_login_at.is_some());
    }

    #[tokio::test]
    async fn delete_user_cascades_and_reports_missing() {
        let repo = InMemoryRepositoryProvider::new();
        repo.upsert_user(profile("u-1")).await.unwrap();
        repo.upsert_progress("u-1", 5, &ProgressUpdate::default(), Utc::now())
            .await
            .unwrap();

        repo.delete_user("u-1").await.unwrap();
        assert!(repo.find("u-1", 5).await.unwrap().is_none());
        assert!(matches!(
            repo.delete_user("u-1").await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn list_users_filters_and_paginates() {
        let repo = InMemoryRepositoryProvider::new();
        for i in 0..5 {
            repo.upsert_user(profile(&format!("u-{}", i))).await.unwrap();
        }
        repo.update_user(
            "u-0",
            UpdateUserDto {
                role: Some(UserRole::Teacher),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let page = repo
            .list_users(GetUserDto {
                page: Some(2),
                page_size: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_pages, 3);

        let teachers = repo
            .list_users(GetUserDto {
                role: Some(UserRole::Teacher),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(teachers.total, 1);

        let search = repo
            .list_users(GetUserDto {
                search: Some("U-3@".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(search.items[0].id, "u-3");
    }

    #[tokio::test]
    async fn replace_role_permissions_swaps_the_whole_set() {
        let repo = InMemoryRepositoryProvider::new();
        repo.replace_role_permissions(
            UserRole::Teacher,
            &[Permission::ManageContent, Permission::ViewAnalytics],
        )
        .await
        .unwrap();
        repo.replace_role_permissions(UserRole::Teacher, &[Permission::GradeAssignments])
            .await
            .unwrap();

        let rows = repo.role_permissions(UserRole::Teacher).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!repo
            .role_grants(UserRole::Teacher, Permission::ManageContent)
            .await
            .unwrap());
        assert!(repo
            .role_grants(UserRole::Teacher, Permission::GradeAssignments)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn reset_swaps_listed_roles_and_drops_the_rest() {
        let repo = InMemoryRepositoryProvider::new();
        repo.replace_role_permissions(UserRole::Student, &[Permission::ViewAnalytics])
            .await
            .unwrap();
        repo.replace_role_permissions(UserRole::Teacher, &[Permission::ManageContent])
            .await
            .unwrap();

        repo.reset_role_permissions(&[(UserRole::Teacher, vec![Permission::GradeAssignments])])
            .await
            .unwrap();

        assert!(repo.role_permissions(UserRole::Student).await.unwrap().is_empty());
        let teacher = repo.role_permissions(UserRole::Teacher).await.unwrap();
        assert_eq!(teacher.len(), 1);
        assert_eq!(teacher[0].permission, Permission::GradeAssignments);
    }

    #[tokio::test]
    async fn override_upsert_keeps_one_row_per_pair() {
        let repo = InMemoryRepositoryProvider::new();
        let mk = |granted| NewUserOverride {
            user_id: "u-1".into(),
            permission: Permission::ViewAnalytics,
            is_granted: granted,
            granted_by: Some("admin".into()),
            reason: None,
            expires_at: None,
        };
        let first = repo.upsert_user_override(mk(true)).await.unwrap();
        let second = repo.upsert_user_override(mk(false)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(repo.user_overrides("u-1").await.unwrap().len(), 1);
        assert!(repo
            .delete_user_override("u-1", Permission::ViewAnalytics)
            .await
            .unwrap());
        assert!(!repo
            .delete_user_override("u-1", Permission::ViewAnalytics)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn concurrent_progress_upserts_create_one_row() {
        let repo = std::sync::Arc::new(InMemoryRepositoryProvider::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                let update = ProgressUpdate {
                    time_spent: Some(i),
                    ..Default::default()
                };
                repo.upsert_progress("u-1", 9, &update, Utc::now()).await.unwrap()
            }));
        }
        let ids: Vec<i32> = join_ids(handles).await;
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(repo.progress.len(), 1);
    }

    async fn join_ids(handles: Vec<tokio::task::JoinHandle<StageProgress>>) -> Vec<i32> {
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap().id);
        }
        ids
    }

    #[tokio::test]
    async fn module_listing_hides_soft_deleted_and_stages_are_ordered() {
        let repo = InMemoryRepositoryProvider::new();
        let m = repo
            .create_module(CreateModuleDto {
                title: "Algebra".into(),
                description: None,
                created_by: None,
            })
            .await
            .unwrap();
        for (title, order) in [("second", 2), ("first", 1)] {
            repo.create_stage(CreateStageDto {
                module_id: m.id,
                title: title.into(),
                description: None,
                content: None,
                order_index: order,
                prerequisite_stage_id: None,
                min_time_minutes: None,
            })
            .await
            .unwrap();
        }
        let titles: Vec<String> = repo
            .list_stages(m.id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, ["first", "second"]);

        repo.update_module(
            m.id,
            UpdateModuleDto {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(repo.list_modules().await.unwrap().is_empty());
        assert!(repo.get_module(m.id).await.unwrap().is_some());
    }
}
