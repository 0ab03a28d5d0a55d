//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users;
mod m20250101_000002_create_role_permissions;
mod m20250101_000003_create_user_permissions;
mod m20250101_000004_create_learning_modules;
mod m20250101_000005_create_module_stages;
mod m20250101_000006_create_stage_progress;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users::Migration),
            Box::new(m20250101_000002_create_role_permissions::Migration),
            Box::new(m20250101_000003_create_user_permissions::Migration),
            Box::new(m20250101_000004_create_learning_modules::Migration),
            Box::new(m20250101_000005_create_module_stages::Migration),
            Box::new(m20250101_000006_create_stage_progress::Migration),
        ]
    }
}
