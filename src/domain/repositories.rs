//! Unified access to all per-aggregate repositories.

use async_trait::async_trait;

use super::content::ContentRepository;
use super::permission::PermissionRepository;
use super::progress::ProgressRepository;
use super::user::UserRepository;
use crate::shared::errors::DomainResult;

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let user = repos.users().get_user_by_id("u-1").await?;
///     let row = repos.progress().find("u-1", 7).await?;
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    fn users(&self) -> &dyn UserRepository;
    fn permissions(&self) -> &dyn PermissionRepository;
    fn content(&self) -> &dyn ContentRepository;
    fn progress(&self) -> &dyn ProgressRepository;

    /// Round-trip to the backing store, used by the health check.
    async fn ping(&self) -> DomainResult<()>;
}
