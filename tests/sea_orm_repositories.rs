//! SeaORM repositories against in-memory SQLite with the real migrations.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;

use lms_core::application::authorization::SetOverride;
use lms_core::application::{ContentService, PermissionService, ProgressService, UserService};
use lms_core::domain::{
    CreateModuleDto, CreateStageDto, DomainError, GetUserDto, InteractionTelemetry, Permission,
    ProgressUpdate, RepositoryProvider, UpsertUserDto, UserRole,
};
use lms_core::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};

struct Services {
    repos: Arc<dyn RepositoryProvider>,
    users: UserService,
    permissions: PermissionService,
    content: ContentService,
    progress: ProgressService,
}

async fn services() -> Services {
    // A single connection: every `sqlite::memory:` connection is its own database.
    let db = init_database(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    })
    .await
    .unwrap();
    run_migrations(&db).await.unwrap();

    let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db));
    let permissions = PermissionService::new(repos.clone());
    permissions.seed_default_permissions().await.unwrap();

    Services {
        users: UserService::new(repos.clone()),
        content: ContentService::new(repos.clone()),
        progress: ProgressService::new(repos.clone()),
        permissions,
        repos,
    }
}

fn profile(id: &str) -> UpsertUserDto {
    UpsertUserDto {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
        first_name: Some("Ada".to_string()),
        last_name: None,
        profile_image_url: None,
    }
}

async fn user_with_role(s: &Services, id: &str, role: UserRole) {
    s.users.upsert_user(profile(id)).await.unwrap();
    s.users.update_role(id, role).await.unwrap();
}

async fn stage(s: &Services, content: Option<&str>) -> i32 {
    let module = s
        .content
        .create_module(CreateModuleDto {
            title: "Onboarding".to_string(),
            description: None,
            created_by: None,
        })
        .await
        .unwrap();
    s.content
        .create_stage(CreateStageDto {
            module_id: module.id,
            title: "Welcome video".to_string(),
            description: None,
            content: content.map(str::to_string),
            order_index: 0,
            prerequisite_stage_id: None,
            min_time_minutes: Some(5),
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn ping_succeeds() {
    let s = services().await;
    s.repos.ping().await.unwrap();
}

#[tokio::test]
async fn upsert_keeps_role_and_refreshes_profile() {
    let s = services().await;
    user_with_role(&s, "u1", UserRole::Teacher).await;

    let mut again = profile("u1");
    again.first_name = Some("Grace".to_string());
    let user = s.users.upsert_user(again).await.unwrap();

    assert_eq!(user.role, UserRole::Teacher);
    assert!(user.is_active);
    assert_eq!(user.first_name.as_deref(), Some("Grace"));
}

#[tokio::test]
async fn list_users_filters_by_search_and_role() {
    let s = services().await;
    user_with_role(&s, "alice", UserRole::Teacher).await;
    user_with_role(&s, "bob", UserRole::Student).await;
    user_with_role(&s, "carol", UserRole::Student).await;

    let students = s
        .users
        .list_users(GetUserDto {
            role: Some(UserRole::Student),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(students.total, 2);

    let found = s
        .users
        .list_users(GetUserDto {
            search: Some("ALI".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.total, 1);
    assert_eq!(found.items[0].id, "alice");
}

#[tokio::test]
async fn seeded_defaults_resolve_per_role() {
    let s = services().await;
    user_with_role(&s, "admin", UserRole::SuperAdmin).await;
    user_with_role(&s, "teacher", UserRole::Teacher).await;
    user_with_role(&s, "student", UserRole::Student).await;

    for p in Permission::ALL {
        assert!(s.permissions.has_permission("admin", p).await.unwrap());
        assert!(!s.permissions.has_permission("student", p).await.unwrap());
    }
    assert!(s
        .permissions
        .has_permission("teacher", Permission::ManageContent)
        .await
        .unwrap());
    assert!(!s
        .permissions
        .has_permission("teacher", Permission::ManageUsers)
        .await
        .unwrap());
    assert!(!s
        .permissions
        .has_permission("nobody", Permission::ManageContent)
        .await
        .unwrap());
}

#[tokio::test]
async fn reseeding_is_idempotent() {
    let s = services().await;
    s.permissions.seed_default_permissions().await.unwrap();
    let rows = s.permissions.role_permissions(UserRole::Teacher).await.unwrap();
    assert_eq!(rows.len(), 4);
}

#[tokio::test]
async fn override_revokes_and_grants() {
    let s = services().await;
    user_with_role(&s, "teacher", UserRole::Teacher).await;
    user_with_role(&s, "student", UserRole::Student).await;

    s.permissions
        .set_user_override(
            "teacher",
            SetOverride {
                permission: Permission::ViewAnalytics,
                is_granted: false,
                reason: Some("probation".to_string()),
                expires_at: None,
            },
            None,
        )
        .await
        .unwrap();
    s.permissions
        .set_user_override(
            "student",
            SetOverride {
                permission: Permission::ManageQuotes,
                is_granted: true,
                reason: None,
                expires_at: Some(Utc::now() + Duration::days(7)),
            },
            Some("teacher"),
        )
        .await
        .unwrap();

    let check = |u: &'static str, p| {
        let permissions = &s.permissions;
        async move { permissions.has_permission(u, p).await.unwrap() }
    };
    assert!(check("teacher", Permission::ManageContent).await);
    assert!(!check("teacher", Permission::ViewAnalytics).await);
    assert!(check("student", Permission::ManageQuotes).await);
    assert!(!check("student", Permission::ManageContent).await);
}

#[tokio::test]
async fn override_upsert_keeps_a_single_row() {
    let s = services().await;
    user_with_role(&s, "u1", UserRole::Student).await;

    for granted in [true, false, true] {
        s.permissions
            .set_user_override(
                "u1",
                SetOverride {
                    permission: Permission::ModerateForums,
                    is_granted: granted,
                    reason: None,
                    expires_at: None,
                },
                None,
            )
            .await
            .unwrap();
    }

    let rows = s.permissions.user_overrides("u1").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_granted);

    s.permissions
        .remove_user_override("u1", Permission::ModerateForums)
        .await
        .unwrap();
    assert!(matches!(
        s.permissions
            .remove_user_override("u1", Permission::ModerateForums)
            .await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn replacing_role_permissions_is_a_full_swap() {
    let s = services().await;
    user_with_role(&s, "teacher", UserRole::Teacher).await;

    s.permissions
        .replace_role_permissions(UserRole::Teacher, &[Permission::ManageQuotes])
        .await
        .unwrap();

    assert!(!s
        .permissions
        .has_permission("teacher", Permission::ManageContent)
        .await
        .unwrap());
    assert!(!s
        .permissions
        .has_permission("teacher", Permission::GradeAssignments)
        .await
        .unwrap());
    assert!(s
        .permissions
        .has_permission("teacher", Permission::ManageQuotes)
        .await
        .unwrap());
}

#[tokio::test]
async fn progress_merges_then_completes() {
    let s = services().await;
    user_with_role(&s, "learner", UserRole::Student).await;
    let stage_id = stage(&s, None).await;

    let first = s
        .progress
        .record_progress(
            "learner",
            stage_id,
            ProgressUpdate {
                time_spent: Some(60),
                interaction_data: Some(json!({"scrollPercentage": 40})),
                validation_met: None,
            },
        )
        .await
        .unwrap();

    let second = s
        .progress
        .record_progress(
            "learner",
            stage_id,
            ProgressUpdate {
                time_spent: Some(120),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.time_spent, Some(120));
    assert_eq!(second.interaction_data, Some(json!({"scrollPercentage": 40})));
    assert!(second.last_active_at >= first.last_active_at);
    assert!(second.completed_at.is_none());

    let done = s.progress.complete_stage("learner", stage_id).await.unwrap();
    let again = s.progress.complete_stage("learner", stage_id).await.unwrap();
    assert_eq!(done.id, again.id);
    assert!(again.validation_met);
    assert!(again.completed_at.is_some());
    assert_eq!(again.time_spent, Some(120));
}

#[tokio::test]
async fn completed_stage_ignores_a_later_validation_flag() {
    let s = services().await;
    user_with_role(&s, "learner", UserRole::Student).await;
    let stage_id = stage(&s, None).await;
    s.progress.complete_stage("learner", stage_id).await.unwrap();

    let row = s
        .progress
        .record_progress(
            "learner",
            stage_id,
            ProgressUpdate {
                time_spent: Some(90),
                validation_met: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(row.validation_met);
    assert!(row.completed_at.is_some());
    assert_eq!(row.time_spent, Some(90));
}

#[tokio::test]
async fn validation_flag_still_updates_before_completion() {
    let s = services().await;
    user_with_role(&s, "learner", UserRole::Student).await;
    let stage_id = stage(&s, None).await;

    let met = |flag| ProgressUpdate {
        validation_met: Some(flag),
        ..Default::default()
    };
    let row = s.progress.record_progress("learner", stage_id, met(true)).await.unwrap();
    assert!(row.validation_met);
    let row = s.progress.record_progress("learner", stage_id, met(false)).await.unwrap();
    assert!(!row.validation_met);
}

#[tokio::test]
async fn completing_without_progress_creates_the_row() {
    let s = services().await;
    user_with_role(&s, "learner", UserRole::Student).await;
    let stage_id = stage(&s, None).await;

    let row = s.progress.complete_stage("learner", stage_id).await.unwrap();
    assert_eq!(row.time_spent, Some(0));
    assert!(row.validation_met);

    let module_id = s.content.get_stage(stage_id).await.unwrap().module_id;
    let rows = s.progress.module_progress("learner", module_id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].stage_id, stage_id);
}

#[tokio::test]
async fn validation_reads_requirements_from_stored_content() {
    let s = services().await;
    let stage_id = stage(
        &s,
        Some(r#"{"type":"video","interactionRequirements":{"videoWatchPercentage":80}}"#),
    )
    .await;

    let watched = |pct: f64| InteractionTelemetry {
        video_watch_percentage: Some(pct),
        ..Default::default()
    };
    assert!(!s
        .progress
        .validate_interaction("learner", stage_id, &watched(79.0))
        .await
        .unwrap());
    assert!(s
        .progress
        .validate_interaction("learner", stage_id, &watched(80.0))
        .await
        .unwrap());
}

#[tokio::test]
async fn stray_requirement_key_keeps_the_video_threshold() {
    let s = services().await;
    let stage_id = stage(
        &s,
        Some(r#"{"interactionRequirements":{"videoWatchPercentage":80,"clickTracking":"all"}}"#),
    )
    .await;

    let telemetry = InteractionTelemetry {
        video_watch_percentage: Some(10.0),
        ..Default::default()
    };
    assert!(!s
        .progress
        .validate_interaction("learner", stage_id, &telemetry)
        .await
        .unwrap());
}

#[tokio::test]
async fn deleting_a_user_cascades() {
    let s = services().await;
    user_with_role(&s, "gone", UserRole::Student).await;
    let stage_id = stage(&s, None).await;
    s.progress.complete_stage("gone", stage_id).await.unwrap();
    s.permissions
        .set_user_override(
            "gone",
            SetOverride {
                permission: Permission::ManageQuotes,
                is_granted: true,
                reason: None,
                expires_at: None,
            },
            None,
        )
        .await
        .unwrap();

    s.users.delete_user("gone").await.unwrap();

    assert!(s.repos.progress().find("gone", stage_id).await.unwrap().is_none());
    assert!(s
        .repos
        .permissions()
        .user_overrides("gone")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn deleting_a_stage_removes_its_progress() {
    let s = services().await;
    user_with_role(&s, "learner", UserRole::Student).await;
    let stage_id = stage(&s, None).await;
    s.progress.complete_stage("learner", stage_id).await.unwrap();

    s.content.delete_stage(stage_id).await.unwrap();

    assert!(s
        .repos
        .progress()
        .find("learner", stage_id)
        .await
        .unwrap()
        .is_none());
}
