//! Learning modules and their stages

use std::sync::Arc;

use tracing::info;

use crate::domain::{
    CreateModuleDto, CreateStageDto, DomainError, DomainResult, LearningModule, RepositoryProvider,
    Stage, UpdateModuleDto, UpdateStageDto,
};

pub struct ContentService {
    repos: Arc<dyn RepositoryProvider>,
}

impl ContentService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    // ── Modules ─────────────────────────────────────────────────

    pub async fn list_modules(&self) -> DomainResult<Vec<LearningModule>> {
        self.repos.content().list_modules().await
    }

    pub async fn get_module(&self, id: i32) -> DomainResult<LearningModule> {
        self.repos
            .content()
            .get_module(id)
            .await?
            .ok_or_else(|| DomainError::not_found("LearningModule", "id", id))
    }

    pub async fn create_module(&self, dto: CreateModuleDto) -> DomainResult<LearningModule> {
        require_title(&dto.title)?;
        let module = self.repos.content().create_module(dto).await?;
        info!(module_id = module.id, title = %module.title, "Module created");
        Ok(module)
    }

    pub async fn update_module(&self, id: i32, dto: UpdateModuleDto) -> DomainResult<LearningModule> {
        if let Some(ref title) = dto.title {
            require_title(title)?;
        }
        self.repos
            .content()
            .update_module(id, dto)
            .await?
            .ok_or_else(|| DomainError::not_found("LearningModule", "id", id))
    }

    /// Soft delete: the module disappears from listings but its stages and
    /// progress survive.
    pub async fn delete_module(&self, id: i32) -> DomainResult<()> {
        self.update_module(
            id,
            UpdateModuleDto {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await?;
        info!(module_id = id, "Module deactivated");
        Ok(())
    }

    // ── Stages ──────────────────────────────────────────────────

    pub async fn list_stages(&self, module_id: i32) -> DomainResult<Vec<Stage>> {
        self.get_module(module_id).await?;
        self.repos.content().list_stages(module_id).await
    }

    pub async fn list_all_stages(&self) -> DomainResult<Vec<Stage>> {
        self.repos.content().list_all_stages().await
    }

    pub async fn get_stage(&self, id: i32) -> DomainResult<Stage> {
        self.repos
            .content()
            .get_stage(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Stage", "id", id))
    }

    pub async fn create_stage(&self, dto: CreateStageDto) -> DomainResult<Stage> {
        require_title(&dto.title)?;
        self.get_module(dto.module_id).await?;
        let stage = self.repos.content().create_stage(dto).await?;
        info!(stage_id = stage.id, module_id = stage.module_id, "Stage created");
        Ok(stage)
    }

    pub async fn update_stage(&self, id: i32, dto: UpdateStageDto) -> DomainResult<Stage> {
        if let Some(ref title) = dto.title {
            require_title(title)?;
        }
        self.repos
            .content()
            .update_stage(id, dto)
            .await?
            .ok_or_else(|| DomainError::not_found("Stage", "id", id))
    }

    pub async fn delete_stage(&self, id: i32) -> DomainResult<()> {
        if !self.repos.content().delete_stage(id).await? {
            return Err(DomainError::not_found("Stage", "id", id));
        }
        info!(stage_id = id, "Stage deleted");
        Ok(())
    }
}

fn require_title(title: &str) -> DomainResult<()> {
    if title.trim().is_empty() {
        return Err(DomainError::Validation("Title must not be empty".into()));
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    fn service() -> ContentService {
        ContentService::new(Arc::new(InMemoryRepositoryProvider::new()))
    }

    fn module(title: &str) -> CreateModuleDto {
        CreateModuleDto {
            title: title.into(),
            description: None,
            created_by: Some("admin".into()),
        }
    }

    fn stage(module_id: i32, order_index: i32) -> CreateStageDto {
        CreateStageDto {
            module_id,
            title: format!("Stage {}", order_index),
            description: None,
            content: None,
            order_index,
            prerequisite_stage_id: None,
            min_time_minutes: None,
        }
    }

    #[tokio::test]
    async fn stage_requires_existing_module() {
        let err = service().create_stage(stage(42, 1)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "LearningModule", .. }));
    }

    #[tokio::test]
    async fn blank_titles_are_rejected() {
        let svc = service();
        assert!(matches!(
            svc.create_module(module("  ")).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn soft_deleted_module_keeps_its_stages() {
        let svc = service();
        let m = svc.create_module(module("Physics")).await.unwrap();
        svc.create_stage(stage(m.id, 1)).await.unwrap();

        svc.delete_module(m.id).await.unwrap();

        assert!(svc.list_modules().await.unwrap().is_empty());
        assert_eq!(svc.list_stages(m.id).await.unwrap().len(), 1);
        assert!(!svc.get_module(m.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn stage_update_and_delete() {
        let svc = service();
        let m = svc.create_module(module("Chemistry")).await.unwrap();
        let s = svc.create_stage(stage(m.id, 1)).await.unwrap();

        let updated = svc
            .update_stage(
                s.id,
                UpdateStageDto {
                    content: Some(r#"{"interactionRequirements":{"scrollCompletion":90}}"#.into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.content.is_some());

        svc.delete_stage(s.id).await.unwrap();
        assert!(matches!(
            svc.delete_stage(s.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
