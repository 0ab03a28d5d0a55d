//! Create role_permissions table migration

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RolePermissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RolePermissions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RolePermissions::Role).string_len(20).not_null())
                    .col(
                        ColumnDef::new(RolePermissions::Permission)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RolePermissions::IsGranted)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(RolePermissions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per (role, permission)
        manager
            .create_index(
                Index::create()
                    .name("idx_role_permissions_role_permission")
                    .table(RolePermissions::Table)
                    .col(RolePermissions::Role)
                    .col(RolePermissions::Permission)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RolePermissions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum RolePermissions {
    Table,
    Id,
    Role,
    Permission,
    IsGranted,
    CreatedAt,
}
