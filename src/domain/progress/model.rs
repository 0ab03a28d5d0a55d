//! Stage progress entity and its state transitions

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Lifecycle of a `(user, stage)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    NotStarted,
    InProgress,
    Completed,
}

impl ProgressState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// State of an optional row; no row means the learner never started.
    pub fn of(progress: Option<&StageProgress>) -> Self {
        progress.map_or(Self::NotStarted, StageProgress::state)
    }
}

/// Fields a learner's client may report. `None` leaves the stored value
/// untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressUpdate {
    /// Accumulated seconds on the stage.
    pub time_spent: Option<i32>,
    /// Last-known interaction telemetry, stored as reported.
    pub interaction_data: Option<Value>,
    pub validation_met: Option<bool>,
}

/// One row per `(user_id, stage_id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct StageProgress {
    pub id: i32,
    pub user_id: String,
    pub stage_id: i32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub time_spent: Option<i32>,
    pub interaction_data: Option<Value>,
    pub validation_met: bool,
    pub last_active_at: DateTime<Utc>,
}

impl StageProgress {
    /// First `record_progress` call: a fresh in-progress row.
    pub fn started(
        id: i32,
        user_id: impl Into<String>,
        stage_id: i32,
        update: &ProgressUpdate,
        now: DateTime<Utc>,
    ) -> Self {
        let mut progress = Self {
            id,
            user_id: user_id.into(),
            stage_id,
            started_at: now,
            completed_at: None,
            time_spent: None,
            interaction_data: None,
            validation_met: false,
            last_active_at: now,
        };
        progress.apply(update, now);
        progress
    }

    /// `complete_stage` without a prior row: created directly completed.
    pub fn completed(id: i32, user_id: impl Into<String>, stage_id: i32, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            stage_id,
            started_at: now,
            completed_at: Some(now),
            time_spent: Some(0),
            interaction_data: None,
            validation_met: true,
            last_active_at: now,
        }
    }

    /// Merge supplied fields over the stored ones and bump `last_active_at`.
    ///
    /// Completion is terminal: a completed row keeps `validation_met`
    /// whatever the update reports.
    pub fn apply(&mut self, update: &ProgressUpdate, now: DateTime<Utc>) {
        if let Some(time_spent) = update.time_spent {
            self.time_spent = Some(time_spent);
        }
        if let Some(ref data) = update.interaction_data {
            self.interaction_data = Some(data.clone());
        }
        if let Some(met) = update.validation_met.filter(|_| self.completed_at.is_none()) {
            self.validation_met = met;
        }
        self.last_active_at = now;
    }

    /// Idempotent: a second call only re-stamps `completed_at`.
    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.completed_at = Some(now);
        self.validation_met = true;
        self.last_active_at = now;
    }

    pub fn state(&self) -> ProgressState {
        if self.completed_at.is_some() {
            ProgressState::Completed
        } else {
            ProgressState::InProgress
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn first_update_starts_the_stage() {
        let now = Utc::now();
        let update = ProgressUpdate {
            time_spent: Some(30),
            interaction_data: Some(json!({"scrollPercentage": 40})),
            validation_met: None,
        };
        let p = StageProgress::started(1, "u-1", 7, &update, now);

        assert_eq!(p.state(), ProgressState::InProgress);
        assert_eq!(p.started_at, now);
        assert_eq!(p.last_active_at, now);
        assert_eq!(p.time_spent, Some(30));
        assert!(!p.validation_met);
    }

    #[test]
    fn later_update_merges_over_stored_fields() {
        let t0 = Utc::now();
        let t1 = t0 + Duration::seconds(45);
        let mut p = StageProgress::started(
            1,
            "u-1",
            7,
            &ProgressUpdate {
                time_spent: Some(30),
                interaction_data: Some(json!({"scrollPercentage": 40})),
                validation_met: None,
            },
            t0,
        );

        p.apply(
            &ProgressUpdate {
                time_spent: Some(75),
                ..Default::default()
            },
            t1,
        );

        assert_eq!(p.time_spent, Some(75));
        assert_eq!(p.interaction_data, Some(json!({"scrollPercentage": 40})));
        assert_eq!(p.started_at, t0);
        assert_eq!(p.last_active_at, t1);
    }

    #[test]
    fn completing_without_progress_synthesizes_a_row() {
        let now = Utc::now();
        let p = StageProgress::completed(1, "u-1", 7, now);
        assert_eq!(p.state(), ProgressState::Completed);
        assert_eq!(p.time_spent, Some(0));
        assert!(p.validation_met);
    }

    #[test]
    fn completion_is_idempotent() {
        let t0 = Utc::now();
        let t1 = t0 + Duration::minutes(1);
        let mut p = StageProgress::started(1, "u-1", 7, &ProgressUpdate::default(), t0);

        p.complete(t0);
        p.complete(t1);

        assert!(p.validation_met);
        assert_eq!(p.completed_at, Some(t1));
        assert_eq!(p.state(), ProgressState::Completed);
    }

    #[test]
    fn completed_row_keeps_validation_met() {
        let now = Utc::now();
        let mut p = StageProgress::completed(1, "u-1", 7, now);

        p.apply(
            &ProgressUpdate {
                time_spent: Some(120),
                validation_met: Some(false),
                ..Default::default()
            },
            now,
        );

        assert!(p.validation_met);
        assert_eq!(p.time_spent, Some(120));
        assert_eq!(p.state(), ProgressState::Completed);
    }

    #[test]
    fn absent_row_is_not_started() {
        assert_eq!(ProgressState::of(None), ProgressState::NotStarted);
    }
}
