//! Create user_permissions table migration

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserPermissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserPermissions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserPermissions::UserId).string().not_null())
                    .col(
                        ColumnDef::new(UserPermissions::Permission)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserPermissions::IsGranted)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserPermissions::GrantedBy).string().null())
                    .col(ColumnDef::new(UserPermissions::Reason).text().null())
                    .col(
                        ColumnDef::new(UserPermissions::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(UserPermissions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_permissions_user_id")
                            .from(UserPermissions::Table, UserPermissions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One override per (user, permission)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_permissions_user_permission")
                    .table(UserPermissions::Table)
                    .col(UserPermissions::UserId)
                    .col(UserPermissions::Permission)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserPermissions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum UserPermissions {
    Table,
    Id,
    UserId,
    Permission,
    IsGranted,
    GrantedBy,
    Reason,
    ExpiresAt,
    CreatedAt,
}
