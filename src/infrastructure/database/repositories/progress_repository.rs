//! Stage progress persistence
//!
//! Both writes are a single `INSERT … ON CONFLICT (user_id, stage_id) DO
//! UPDATE` followed by a re-read inside one transaction. The conflict
//! update list only names the columns the caller supplied, which gives
//! merge semantics without a read-modify-write race. Once `completed_at` is
//! set, `validation_met` is only ever written by completion.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};

use super::db_err;
use crate::domain::{DomainError, DomainResult, ProgressRepository, ProgressUpdate, StageProgress};
use crate::infrastructure::database::entities::{module_stage, stage_progress};
use crate::shared::errors::InfraError;

pub struct SeaOrmProgressRepository {
    db: DatabaseConnection,
}

impl SeaOrmProgressRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn progress_model_to_domain(model: stage_progress::Model) -> DomainResult<StageProgress> {
    let interaction_data = model
        .interaction_data
        .as_deref()
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .map_err(InfraError::from)?;

    Ok(StageProgress {
        id: model.id,
        user_id: model.user_id,
        stage_id: model.stage_id,
        started_at: model.started_at,
        completed_at: model.completed_at,
        time_spent: model.time_spent,
        interaction_data,
        validation_met: model.validation_met,
        last_active_at: model.last_active_at,
    })
}

async fn find_row<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    stage_id: i32,
) -> DomainResult<Option<stage_progress::Model>> {
    stage_progress::Entity::find()
        .filter(stage_progress::Column::UserId.eq(user_id))
        .filter(stage_progress::Column::StageId.eq(stage_id))
        .one(conn)
        .await
        .map_err(db_err)
}

fn conflict_on_pair() -> OnConflict {
    OnConflict::columns([stage_progress::Column::UserId, stage_progress::Column::StageId])
}

impl SeaOrmProgressRepository {
    async fn upsert(
        &self,
        model: stage_progress::ActiveModel,
        on_conflict: OnConflict,
        user_id: &str,
        stage_id: i32,
    ) -> DomainResult<StageProgress> {
        let txn = self.db.begin().await.map_err(db_err)?;

        stage_progress::Entity::insert(model)
            .on_conflict(on_conflict)
            .exec_without_returning(&txn)
            .await
            .map_err(db_err)?;

        let row = find_row(&txn, user_id, stage_id).await?.ok_or_else(|| {
            DomainError::Storage(format!(
                "Progress {}/{} vanished after upsert",
                user_id, stage_id
            ))
        })?;

        txn.commit().await.map_err(db_err)?;
        progress_model_to_domain(row)
    }
}

#[async_trait]
impl ProgressRepository for SeaOrmProgressRepository {
    async fn find(&self, user_id: &str, stage_id: i32) -> DomainResult<Option<StageProgress>> {
        find_row(&self.db, user_id, stage_id)
            .await?
            .map(progress_model_to_domain)
            .transpose()
    }

    async fn upsert_progress(
        &self,
        user_id: &str,
        stage_id: i32,
        update: &ProgressUpdate,
        now: DateTime<Utc>,
    ) -> DomainResult<StageProgress> {
        let interaction_data = update
            .interaction_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(InfraError::from)?;

        let mut columns = vec![stage_progress::Column::LastActiveAt];
        if update.time_spent.is_some() {
            columns.push(stage_progress::Column::TimeSpent);
        }
        if interaction_data.is_some() {
            columns.push(stage_progress::Column::InteractionData);
        }

        let model = stage_progress::ActiveModel {
            user_id: Set(user_id.to_string()),
            stage_id: Set(stage_id),
            started_at: Set(now),
            completed_at: Set(None),
            time_spent: Set(update.time_spent),
            interaction_data: Set(interaction_data),
            validation_met: Set(update.validation_met.unwrap_or(false)),
            last_active_at: Set(now),
            ..Default::default()
        };

        let mut on_conflict = conflict_on_pair();
        on_conflict.update_columns(columns);
        if update.validation_met.is_some() {
            on_conflict.value(
                stage_progress::Column::ValidationMet,
                Expr::cust(
                    "CASE WHEN stage_progress.completed_at IS NULL \
                     THEN excluded.validation_met ELSE stage_progress.validation_met END",
                ),
            );
        }

        self.upsert(model, on_conflict, user_id, stage_id).await
    }

    async fn mark_completed(
        &self,
        user_id: &str,
        stage_id: i32,
        now: DateTime<Utc>,
    ) -> DomainResult<StageProgress> {
        let model = stage_progress::ActiveModel {
            user_id: Set(user_id.to_string()),
            stage_id: Set(stage_id),
            started_at: Set(now),
            completed_at: Set(Some(now)),
            time_spent: Set(Some(0)),
            interaction_data: Set(None),
            validation_met: Set(true),
            last_active_at: Set(now),
            ..Default::default()
        };

        // time_spent and started_at of an existing row are kept
        let mut on_conflict = conflict_on_pair();
        on_conflict.update_columns([
            stage_progress::Column::CompletedAt,
            stage_progress::Column::ValidationMet,
            stage_progress::Column::LastActiveAt,
        ]);

        self.upsert(model, on_conflict, user_id, stage_id).await
    }

    async fn list_for_module(
        &self,
        user_id: &str,
        module_id: i32,
    ) -> DomainResult<Vec<StageProgress>> {
        let models = stage_progress::Entity::find()
            .join(JoinType::InnerJoin, stage_progress::Relation::Stage.def())
            .filter(stage_progress::Column::UserId.eq(user_id))
            .filter(module_stage::Column::ModuleId.eq(module_id))
            .order_by_asc(stage_progress::Column::StageId)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        models.into_iter().map(progress_model_to_domain).collect()
    }
}
