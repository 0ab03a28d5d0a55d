use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::db_err;
use crate::domain::{
    ContentRepository, CreateModuleDto, CreateStageDto, DomainResult, LearningModule, Stage,
    UpdateModuleDto, UpdateStageDto,
};
use crate::infrastructure::database::entities::{learning_module, module_stage};

pub struct SeaOrmContentRepository {
    db: DatabaseConnection,
}

impl SeaOrmContentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn module_model_to_domain(model: learning_module::Model) -> LearningModule {
    LearningModule {
        id: model.id,
        title: model.title,
        description: model.description,
        is_active: model.is_active,
        created_by: model.created_by,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn stage_model_to_domain(model: module_stage::Model) -> Stage {
    Stage {
        id: model.id,
        module_id: model.module_id,
        title: model.title,
        description: model.description,
        content: model.content,
        order_index: model.order_index,
        prerequisite_stage_id: model.prerequisite_stage_id,
        min_time_minutes: model.min_time_minutes,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

#[async_trait]
impl ContentRepository for SeaOrmContentRepository {
    async fn list_modules(&self) -> DomainResult<Vec<LearningModule>> {
        let models = learning_module::Entity::find()
            .filter(learning_module::Column::IsActive.eq(true))
            .order_by_desc(learning_module::Column::CreatedAt)
            .order_by_desc(learning_module::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(models.into_iter().map(module_model_to_domain).collect())
    }

    async fn get_module(&self, id: i32) -> DomainResult<Option<LearningModule>> {
        let model = learning_module::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(module_model_to_domain))
    }

    async fn create_module(&self, dto: CreateModuleDto) -> DomainResult<LearningModule> {
        let now = Utc::now();
        let model = learning_module::ActiveModel {
            title: Set(dto.title),
            description: Set(dto.description),
            is_active: Set(true),
            created_by: Set(dto.created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let inserted = model.insert(&self.db).await.map_err(db_err)?;
        Ok(module_model_to_domain(inserted))
    }

    async fn update_module(
        &self,
        id: i32,
        dto: UpdateModuleDto,
    ) -> DomainResult<Option<LearningModule>> {
        let Some(existing) = learning_module::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };

        let mut active: learning_module::ActiveModel = existing.into();
        if let Some(title) = dto.title {
            active.title = Set(title);
        }
        if let Some(description) = dto.description {
            active.description = Set(Some(description));
        }
        if let Some(is_active) = dto.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.db).await.map_err(db_err)?;
        Ok(Some(module_model_to_domain(updated)))
    }

    async fn list_stages(&self, module_id: i32) -> DomainResult<Vec<Stage>> {
        let models = module_stage::Entity::find()
            .filter(module_stage::Column::ModuleId.eq(module_id))
            .order_by_asc(module_stage::Column::OrderIndex)
            .order_by_asc(module_stage::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(models.into_iter().map(stage_model_to_domain).collect())
    }

    async fn list_all_stages(&self) -> DomainResult<Vec<Stage>> {
        let models = module_stage::Entity::find()
            .order_by_asc(module_stage::Column::ModuleId)
            .order_by_asc(module_stage::Column::OrderIndex)
            .order_by_asc(module_stage::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(models.into_iter().map(stage_model_to_domain).collect())
    }

    async fn get_stage(&self, id: i32) -> DomainResult<Option<Stage>> {
        let model = module_stage::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(stage_model_to_domain))
    }

    async fn create_stage(&self, dto: CreateStageDto) -> DomainResult<Stage> {
        let now = Utc::now();
        let model = module_stage::ActiveModel {
            module_id: Set(dto.module_id),
            title: Set(dto.title),
            description: Set(dto.description),
            content: Set(dto.content),
            order_index: Set(dto.order_index),
            prerequisite_stage_id: Set(dto.prerequisite_stage_id),
            min_time_minutes: Set(dto.min_time_minutes),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let inserted = model.insert(&self.db).await.map_err(db_err)?;
        Ok(stage_model_to_domain(inserted))
    }

    async fn update_stage(&self, id: i32, dto: UpdateStageDto) -> DomainResult<Option<Stage>> {
        let Some(existing) = module_stage::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };

        let mut active: module_stage::ActiveModel = existing.into();
        if let Some(title) = dto.title {
            active.title = Set(title);
        }
        if let Some(description) = dto.description {
            active.description = Set(Some(description));
        }
        if let Some(content) = dto.content {
            active.content = Set(Some(content));
        }
        if let Some(order_index) = dto.order_index {
            active.order_index = Set(order_index);
        }
        if let Some(prerequisite) = dto.prerequisite_stage_id {
            active.prerequisite_stage_id = Set(Some(prerequisite));
        }
        if let Some(minutes) = dto.min_time_minutes {
            active.min_time_minutes = Set(Some(minutes));
        }
        if let Some(is_active) = dto.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.db).await.map_err(db_err)?;
        Ok(Some(stage_model_to_domain(updated)))
    }

    async fn delete_stage(&self, id: i32) -> DomainResult<bool> {
        let result = module_stage::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected > 0)
    }
}
