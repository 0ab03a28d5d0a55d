use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ProgressUpdate, StageProgress};
use crate::shared::errors::DomainResult;

/// Store port for progress rows.
///
/// Both writes are single atomic insert-or-update operations keyed on the
/// unique `(user_id, stage_id)` pair; implementations must never create a
/// second row for the same pair.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    async fn find(&self, user_id: &str, stage_id: i32) -> DomainResult<Option<StageProgress>>;

    /// Create the row in progress (`started_at = now`) or merge `update`
    /// into the existing one. Always sets `last_active_at = now`.
    async fn upsert_progress(
        &self,
        user_id: &str,
        stage_id: i32,
        update: &ProgressUpdate,
        now: DateTime<Utc>,
    ) -> DomainResult<StageProgress>;

    /// Stamp completion, creating a completed row with `time_spent = 0`
    /// when none exists.
    async fn mark_completed(
        &self,
        user_id: &str,
        stage_id: i32,
        now: DateTime<Utc>,
    ) -> DomainResult<StageProgress>;

    /// Progress rows of `user_id` for the stages of `module_id`.
    async fn list_for_module(&self, user_id: &str, module_id: i32)
        -> DomainResult<Vec<StageProgress>>;
}
