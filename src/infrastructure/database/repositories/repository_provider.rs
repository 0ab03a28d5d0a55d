//! SeaORM implementation of RepositoryProvider

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::domain::{
    ContentRepository, DomainResult, PermissionRepository, ProgressRepository, RepositoryProvider,
    UserRepository,
};

use super::content_repository::SeaOrmContentRepository;
use super::db_err;
use super::permission_repository::SeaOrmPermissionRepository;
use super::progress_repository::SeaOrmProgressRepository;
use super::user_repository::SeaOrmUserRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let granted = repos.permissions().role_grants(UserRole::Teacher, Permission::ManageContent).await?;
/// let row = repos.progress().find("user-1", 7).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    db: DatabaseConnection,
    users: SeaOrmUserRepository,
    permissions: SeaOrmPermissionRepository,
    content: SeaOrmContentRepository,
    progress: SeaOrmProgressRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: SeaOrmUserRepository::new(db.clone()),
            permissions: SeaOrmPermissionRepository::new(db.clone()),
            content: SeaOrmContentRepository::new(db.clone()),
            progress: SeaOrmProgressRepository::new(db.clone()),
            db,
        }
    }
}

#[async_trait]
impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn permissions(&self) -> &dyn PermissionRepository {
        &self.permissions
    }

    fn content(&self) -> &dyn ContentRepository {
        &self.content
    }

    fn progress(&self) -> &dyn ProgressRepository {
        &self.progress
    }

    async fn ping(&self) -> DomainResult<()> {
        self.db.ping().await.map_err(db_err)
    }
}
