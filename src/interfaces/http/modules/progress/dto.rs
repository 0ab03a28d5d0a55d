use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{InteractionTelemetry, ProgressState, ProgressUpdate, StageProgress};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StageProgressDto {
    pub id: i32,
    pub user_id: String,
    pub stage_id: i32,
    /// not_started, in_progress or completed
    pub state: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub time_spent: Option<i32>,
    #[schema(value_type = Option<Object>)]
    pub interaction_data: Option<Value>,
    pub validation_met: bool,
    pub last_active_at: DateTime<Utc>,
}

impl From<StageProgress> for StageProgressDto {
    fn from(p: StageProgress) -> Self {
        Self {
            id: p.id,
            state: p.state().as_str().to_string(),
            user_id: p.user_id,
            stage_id: p.stage_id,
            started_at: p.started_at,
            completed_at: p.completed_at,
            time_spent: p.time_spent,
            interaction_data: p.interaction_data,
            validation_met: p.validation_met,
            last_active_at: p.last_active_at,
        }
    }
}

/// `GET /stages/{id}/progress` answers with a state even when no row exists.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StageProgressView {
    pub stage_id: i32,
    pub state: String,
    pub progress: Option<StageProgressDto>,
}

impl StageProgressView {
    pub fn new(stage_id: i32, progress: Option<StageProgress>) -> Self {
        Self {
            stage_id,
            state: ProgressState::of(progress.as_ref()).as_str().to_string(),
            progress: progress.map(StageProgressDto::from),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct RecordProgressRequest {
    /// Accumulated seconds on the stage
    #[validate(range(min = 0, message = "time_spent must not be negative"))]
    pub time_spent: Option<i32>,
    #[schema(value_type = Option<Object>)]
    pub interaction_data: Option<Value>,
    pub validation_met: Option<bool>,
}

impl From<RecordProgressRequest> for ProgressUpdate {
    fn from(r: RecordProgressRequest) -> Self {
        Self {
            time_spent: r.time_spent,
            interaction_data: r.interaction_data,
            validation_met: r.validation_met,
        }
    }
}

/// Client telemetry checked against the stage's interaction requirements
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateInteractionRequest {
    #[validate(range(min = 0.0, max = 100.0))]
    pub scroll_percentage: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub video_watch_percentage: Option<f64>,
    pub form_interacted: Option<bool>,
}

impl From<ValidateInteractionRequest> for InteractionTelemetry {
    fn from(r: ValidateInteractionRequest) -> Self {
        Self {
            scroll_percentage: r.scroll_percentage,
            video_watch_percentage: r.video_watch_percentage,
            form_interacted: r.form_interacted,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateInteractionResponse {
    pub is_valid: bool,
}
