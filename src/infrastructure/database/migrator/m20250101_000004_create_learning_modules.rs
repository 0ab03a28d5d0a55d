//! Create learning_modules table migration

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LearningModules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LearningModules::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LearningModules::Title).string_len(255).not_null())
                    .col(ColumnDef::new(LearningModules::Description).text().null())
                    .col(
                        ColumnDef::new(LearningModules::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(LearningModules::CreatedBy).string().null())
                    .col(
                        ColumnDef::new(LearningModules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LearningModules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LearningModules::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum LearningModules {
    Table,
    Id,
    Title,
    Description,
    IsActive,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
