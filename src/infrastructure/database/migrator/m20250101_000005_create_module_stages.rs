//! Create module_stages table migration

use sea_orm_migration::prelude::*;

use super::m20250101_000004_create_learning_modules::LearningModules;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ModuleStages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ModuleStages::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ModuleStages::ModuleId).integer().not_null())
                    .col(ColumnDef::new(ModuleStages::Title).string_len(255).not_null())
                    .col(ColumnDef::new(ModuleStages::Description).text().null())
                    .col(ColumnDef::new(ModuleStages::Content).text().null())
                    .col(
                        ColumnDef::new(ModuleStages::OrderIndex)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ModuleStages::PrerequisiteStageId).integer().null())
                    .col(ColumnDef::new(ModuleStages::MinTimeMinutes).integer().null())
                    .col(
                        ColumnDef::new(ModuleStages::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ModuleStages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ModuleStages::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_module_stages_module_id")
                            .from(ModuleStages::Table, ModuleStages::ModuleId)
                            .to(LearningModules::Table, LearningModules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_module_stages_module_order")
                    .table(ModuleStages::Table)
                    .col(ModuleStages::ModuleId)
                    .col(ModuleStages::OrderIndex)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ModuleStages::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ModuleStages {
    Table,
    Id,
    ModuleId,
    Title,
    Description,
    Content,
    OrderIndex,
    PrerequisiteStageId,
    MinTimeMinutes,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
