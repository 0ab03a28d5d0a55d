//! Module and stage DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{LearningModule, Stage};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ModuleDto {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LearningModule> for ModuleDto {
    fn from(m: LearningModule) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            is_active: m.is_active,
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Stage as served to clients. Stored content that is not valid JSON is
/// passed through as a string.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StageDto {
    pub id: i32,
    pub module_id: i32,
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub content: Option<Value>,
    pub order_index: i32,
    pub prerequisite_stage_id: Option<i32>,
    pub min_time_minutes: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Stage> for StageDto {
    fn from(s: Stage) -> Self {
        let content = s
            .content
            .map(|raw| serde_json::from_str(&raw).unwrap_or(Value::String(raw)));
        Self {
            id: s.id,
            module_id: s.module_id,
            title: s.title,
            description: s.description,
            content,
            order_index: s.order_index,
            prerequisite_stage_id: s.prerequisite_stage_id,
            min_time_minutes: s.min_time_minutes,
            is_active: s.is_active,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Content is stored as its JSON text.
pub(crate) fn content_text(content: Option<Value>) -> Option<String> {
    content.map(|v| match v {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateModuleRequest {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateModuleRequest {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStageRequest {
    pub module_id: i32,
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,
    pub description: Option<String>,
    /// Free-form JSON; may carry `interactionRequirements`
    #[schema(value_type = Option<Object>)]
    pub content: Option<Value>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub order_index: i32,
    pub prerequisite_stage_id: Option<i32>,
    #[validate(range(min = 0))]
    pub min_time_minutes: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStageRequest {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub content: Option<Value>,
    #[validate(range(min = 0))]
    pub order_index: Option<i32>,
    pub prerequisite_stage_id: Option<i32>,
    #[validate(range(min = 0))]
    pub min_time_minutes: Option<i32>,
    pub is_active: Option<bool>,
}
