//! Create stage_progress table migration

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_users::Users;
use super::m20250101_000005_create_module_stages::ModuleStages;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StageProgress::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StageProgress::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StageProgress::UserId).string().not_null())
                    .col(ColumnDef::new(StageProgress::StageId).integer().not_null())
                    .col(
                        ColumnDef::new(StageProgress::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StageProgress::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(StageProgress::TimeSpent).integer().null())
                    .col(ColumnDef::new(StageProgress::InteractionData).text().null())
                    .col(
                        ColumnDef::new(StageProgress::ValidationMet)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(StageProgress::LastActiveAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stage_progress_user_id")
                            .from(StageProgress::Table, StageProgress::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stage_progress_stage_id")
                            .from(StageProgress::Table, StageProgress::StageId)
                            .to(ModuleStages::Table, ModuleStages::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Upserts conflict on this index
        manager
            .create_index(
                Index::create()
                    .name("idx_stage_progress_user_stage")
                    .table(StageProgress::Table)
                    .col(StageProgress::UserId)
                    .col(StageProgress::StageId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StageProgress::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum StageProgress {
    Table,
    Id,
    UserId,
    StageId,
    StartedAt,
    CompletedAt,
    TimeSpent,
    InteractionData,
    ValidationMet,
    LastActiveAt,
}
