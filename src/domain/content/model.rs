//! Module and stage entities

use chrono::{DateTime, Utc};

/// A learning module: an ordered sequence of stages.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningModule {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unit of content and of progress tracking.
///
/// `content` is free-form JSON authored by teachers (video/pdf/quiz
/// descriptors); it may embed an `interactionRequirements` object.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub id: i32,
    pub module_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub order_index: i32,
    pub prerequisite_stage_id: Option<i32>,
    pub min_time_minutes: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateModuleDto {
    pub title: String,
    pub description: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateModuleDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CreateStageDto {
    pub module_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub order_index: i32,
    pub prerequisite_stage_id: Option<i32>,
    pub min_time_minutes: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateStageDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub order_index: Option<i32>,
    pub prerequisite_stage_id: Option<i32>,
    pub min_time_minutes: Option<i32>,
    pub is_active: Option<bool>,
}
