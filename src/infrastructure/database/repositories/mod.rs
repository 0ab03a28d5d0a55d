//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod content_repository;
pub mod permission_repository;
pub mod progress_repository;
pub mod repository_provider;
pub mod user_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

use crate::shared::errors::{DomainError, InfraError};

pub(crate) fn db_err(e: sea_orm::DbErr) -> DomainError {
    InfraError::from(e).into()
}
