use async_trait::async_trait;

use super::{CreateModuleDto, CreateStageDto, LearningModule, Stage, UpdateModuleDto, UpdateStageDto};
use crate::shared::errors::DomainResult;

#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Active modules, newest first.
    async fn list_modules(&self) -> DomainResult<Vec<LearningModule>>;
    async fn get_module(&self, id: i32) -> DomainResult<Option<LearningModule>>;
    async fn create_module(&self, dto: CreateModuleDto) -> DomainResult<LearningModule>;
    async fn update_module(&self, id: i32, dto: UpdateModuleDto)
        -> DomainResult<Option<LearningModule>>;

    /// Stages of one module ordered by `order_index`.
    async fn list_stages(&self, module_id: i32) -> DomainResult<Vec<Stage>>;
    /// Every stage, ordered by module then `order_index`.
    async fn list_all_stages(&self) -> DomainResult<Vec<Stage>>;
    async fn get_stage(&self, id: i32) -> DomainResult<Option<Stage>>;
    async fn create_stage(&self, dto: CreateStageDto) -> DomainResult<Stage>;
    async fn update_stage(&self, id: i32, dto: UpdateStageDto) -> DomainResult<Option<Stage>>;
    /// Returns `false` when the stage did not exist.
    async fn delete_stage(&self, id: i32) -> DomainResult<bool>;
}
