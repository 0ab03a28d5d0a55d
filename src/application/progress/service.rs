//! Learner progress through stages
//!
//! Writes go through the repository's atomic upserts, so concurrent reports
//! for the same `(user, stage)` pair converge on a single row.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::domain::{
    DomainError, DomainResult, InteractionRequirements, InteractionTelemetry, ProgressUpdate,
    RepositoryProvider, StageProgress,
};

pub struct ProgressService {
    repos: Arc<dyn RepositoryProvider>,
}

impl ProgressService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Start or continue a stage, merging the supplied fields.
    pub async fn record_progress(
        &self,
        user_id: &str,
        stage_id: i32,
        update: ProgressUpdate,
    ) -> DomainResult<StageProgress> {
        if update.time_spent.is_some_and(|t| t < 0) {
            return Err(DomainError::Validation(
                "time_spent must not be negative".into(),
            ));
        }
        self.ensure_stage(stage_id).await?;

        let progress = self
            .repos
            .progress()
            .upsert_progress(user_id, stage_id, &update, Utc::now())
            .await?;
        debug!(
            user_id,
            stage_id,
            state = progress.state().as_str(),
            time_spent = ?progress.time_spent,
            "Progress recorded"
        );
        Ok(progress)
    }

    /// Mark a stage completed. Repeating the call is harmless.
    pub async fn complete_stage(&self, user_id: &str, stage_id: i32) -> DomainResult<StageProgress> {
        self.ensure_stage(stage_id).await?;

        let progress = self
            .repos
            .progress()
            .mark_completed(user_id, stage_id, Utc::now())
            .await?;
        metrics::counter!("stage_completions_total").increment(1);
        info!(user_id, stage_id, "Stage completed");
        Ok(progress)
    }

    /// Advisory check of telemetry against the stage's declared
    /// requirements. Never mutates progress; an unknown stage or unreadable
    /// content counts as "no requirements".
    pub async fn validate_interaction(
        &self,
        user_id: &str,
        stage_id: i32,
        telemetry: &InteractionTelemetry,
    ) -> DomainResult<bool> {
        let stage = self.repos.content().get_stage(stage_id).await?;
        let requirements = InteractionRequirements::for_stage(stage.as_ref());

        let unmet = requirements.unmet(telemetry);
        debug!(user_id, stage_id, ?unmet, "Interaction validated");
        Ok(unmet.is_empty())
    }

    pub async fn stage_progress(
        &self,
        user_id: &str,
        stage_id: i32,
    ) -> DomainResult<Option<StageProgress>> {
        self.repos.progress().find(user_id, stage_id).await
    }

    pub async fn module_progress(
        &self,
        user_id: &str,
        module_id: i32,
    ) -> DomainResult<Vec<StageProgress>> {
        if self.repos.content().get_module(module_id).await?.is_none() {
            return Err(DomainError::not_found("LearningModule", "id", module_id));
        }
        self.repos.progress().list_for_module(user_id, module_id).await
    }

    async fn ensure_stage(&self, stage_id: i32) -> DomainResult<()> {
        match self.repos.content().get_stage(stage_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found("Stage", "id", stage_id)),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentRepository, CreateModuleDto, CreateStageDto, ProgressState};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use serde_json::json;

    struct Fixture {
        service: ProgressService,
        module_id: i32,
        stage_id: i32,
    }

    async fn fixture(content: Option<&str>) -> Fixture {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let module = repos
            .create_module(CreateModuleDto {
                title: "Biology".into(),
                description: None,
                created_by: None,
            })
            .await
            .unwrap();
        let stage = repos
            .create_stage(CreateStageDto {
                module_id: module.id,
                title: "Cells".into(),
                description: None,
                content: content.map(str::to_string),
                order_index: 1,
                prerequisite_stage_id: None,
                min_time_minutes: Some(5),
            })
            .await
            .unwrap();
        Fixture {
            service: ProgressService::new(repos),
            module_id: module.id,
            stage_id: stage.id,
        }
    }

    fn video(pct: f64) -> InteractionTelemetry {
        InteractionTelemetry {
            video_watch_percentage: Some(pct),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn sequential_records_merge_into_one_row() {
        let f = fixture(None).await;
        let first = f
            .service
            .record_progress(
                "u-1",
                f.stage_id,
                ProgressUpdate {
                    time_spent: Some(60),
                    interaction_data: Some(json!({"scrollPercentage": 30})),
                    validation_met: None,
                },
            )
            .await
            .unwrap();
        let second = f
            .service
            .record_progress(
                "u-1",
                f.stage_id,
                ProgressUpdate {
                    time_spent: Some(120),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.time_spent, Some(120));
        assert_eq!(second.interaction_data, Some(json!({"scrollPercentage": 30})));
        assert_eq!(second.started_at, first.started_at);
        assert!(second.last_active_at >= first.last_active_at);
        assert_eq!(second.state(), ProgressState::InProgress);
        assert_eq!(
            f.service.module_progress("u-1", f.module_id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn completing_twice_keeps_one_validated_row() {
        let f = fixture(None).await;
        let a = f.service.complete_stage("u-1", f.stage_id).await.unwrap();
        let b = f.service.complete_stage("u-1", f.stage_id).await.unwrap();

        assert_eq!(a.id, b.id);
        assert!(a.validation_met && b.validation_met);
        assert_eq!(a.time_spent, Some(0));
        assert_eq!(b.state(), ProgressState::Completed);
    }

    #[tokio::test]
    async fn completion_keeps_recorded_time() {
        let f = fixture(None).await;
        f.service
            .record_progress(
                "u-1",
                f.stage_id,
                ProgressUpdate {
                    time_spent: Some(300),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let done = f.service.complete_stage("u-1", f.stage_id).await.unwrap();
        assert_eq!(done.time_spent, Some(300));
        assert!(done.completed_at.is_some());
    }

    #[tokio::test]
    async fn unknown_stage_cannot_be_recorded() {
        let f = fixture(None).await;
        let err = f
            .service
            .record_progress("u-1", f.stage_id + 100, ProgressUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Stage", .. }));
    }

    #[tokio::test]
    async fn negative_time_is_rejected() {
        let f = fixture(None).await;
        let err = f
            .service
            .record_progress(
                "u-1",
                f.stage_id,
                ProgressUpdate {
                    time_spent: Some(-1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn video_threshold_boundary() {
        let f = fixture(Some(r#"{"interactionRequirements":{"videoWatchPercentage":80}}"#)).await;
        assert!(!f
            .service
            .validate_interaction("u-1", f.stage_id, &video(79.0))
            .await
            .unwrap());
        assert!(f
            .service
            .validate_interaction("u-1", f.stage_id, &video(80.0))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn lenient_cases_always_pass() {
        for content in [None, Some("{{broken"), Some(r#"{"type":"video"}"#)] {
            let f = fixture(content).await;
            assert!(f
                .service
                .validate_interaction("u-1", f.stage_id, &InteractionTelemetry::default())
                .await
                .unwrap());
        }
        let f = fixture(None).await;
        assert!(f
            .service
            .validate_interaction("u-1", f.stage_id + 100, &video(0.0))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn validation_does_not_touch_progress() {
        let f = fixture(Some(r#"{"interactionRequirements":{"formInteraction":true}}"#)).await;
        f.service
            .validate_interaction("u-1", f.stage_id, &InteractionTelemetry::default())
            .await
            .unwrap();
        assert!(f.service.stage_progress("u-1", f.stage_id).await.unwrap().is_none());
    }
}
