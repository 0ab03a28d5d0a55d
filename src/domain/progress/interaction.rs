//! Interaction requirements declared in stage content, and the check of
//! learner telemetry against them.
//!
//! Parsing is lenient: unparseable content counts as "no requirements", and
//! each requirement is read on its own, so an ill-typed key drops only itself.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::content::Stage;

/// Thresholds a stage may declare under `interactionRequirements`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionRequirements {
    pub scroll_completion: Option<f64>,
    pub video_watch_percentage: Option<f64>,
    pub form_interaction: Option<bool>,
    /// Accepted in content but not enforced.
    pub click_tracking: Option<Vec<String>>,
    /// Accepted in content but not enforced.
    pub minimum_interactions: Option<f64>,
}

/// Telemetry reported by the client for one stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionTelemetry {
    pub scroll_percentage: Option<f64>,
    pub video_watch_percentage: Option<f64>,
    pub form_interacted: Option<bool>,
}

/// A single requirement the telemetry failed to meet.
#[derive(Debug, Clone, PartialEq)]
pub enum UnmetRequirement {
    Scroll { required: f64, actual: Option<f64> },
    Video { required: f64, actual: Option<f64> },
    Form,
}

impl InteractionRequirements {
    /// Extract the requirement set from a stage's JSON content.
    ///
    /// Returns `None` for malformed JSON, a missing key, or a requirements
    /// value that is not an object. Keys of the wrong type are skipped.
    pub fn from_stage_content(content: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(content).ok()?;
        let raw = value.get("interactionRequirements")?.as_object()?;

        Some(Self {
            scroll_completion: raw.get("scrollCompletion").and_then(Value::as_f64),
            video_watch_percentage: raw.get("videoWatchPercentage").and_then(Value::as_f64),
            form_interaction: raw.get("formInteraction").map(truthy),
            click_tracking: raw.get("clickTracking").and_then(|v| {
                v.as_array()?
                    .iter()
                    .map(|id| id.as_str().map(str::to_string))
                    .collect()
            }),
            minimum_interactions: raw.get("minimumInteractions").and_then(Value::as_f64),
        })
    }

    /// Requirements of an optional stage; missing stage or content yields
    /// the empty set.
    pub fn for_stage(stage: Option<&Stage>) -> Self {
        stage
            .and_then(|s| s.content.as_deref())
            .and_then(Self::from_stage_content)
            .unwrap_or_default()
    }

    /// True when nothing is actually enforced.
    pub fn is_empty(&self) -> bool {
        declared(self.scroll_completion).is_none()
            && declared(self.video_watch_percentage).is_none()
            && self.form_interaction != Some(true)
    }

    pub fn unmet(&self, telemetry: &InteractionTelemetry) -> Vec<UnmetRequirement> {
        let mut unmet = Vec::new();

        if let Some(required) = declared(self.scroll_completion) {
            if !meets(telemetry.scroll_percentage, required) {
                unmet.push(UnmetRequirement::Scroll {
                    required,
                    actual: telemetry.scroll_percentage,
                });
            }
        }
        if let Some(required) = declared(self.video_watch_percentage) {
            if !meets(telemetry.video_watch_percentage, required) {
                unmet.push(UnmetRequirement::Video {
                    required,
                    actual: telemetry.video_watch_percentage,
                });
            }
        }
        if self.form_interaction == Some(true) && telemetry.form_interacted != Some(true) {
            unmet.push(UnmetRequirement::Form);
        }

        unmet
    }

    pub fn is_satisfied_by(&self, telemetry: &InteractionTelemetry) -> bool {
        self.unmet(telemetry).is_empty()
    }
}

/// Loose truthiness: `1`, `"yes"` and `{}` all switch a flag on.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A zero threshold declares nothing.
fn declared(threshold: Option<f64>) -> Option<f64> {
    threshold.filter(|t| *t != 0.0)
}

fn meets(actual: Option<f64>, required: f64) -> bool {
    actual.is_some_and(|a| a >= required)
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stage_with(content: Option<&str>) -> Stage {
        let now = Utc::now();
        Stage {
            id: 1,
            module_id: 1,
            title: "Intro".into(),
            description: None,
            content: content.map(str::to_string),
            order_index: 0,
            prerequisite_stage_id: None,
            min_time_minutes: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn video(pct: f64) -> InteractionTelemetry {
        InteractionTelemetry {
            video_watch_percentage: Some(pct),
            ..Default::default()
        }
    }

    #[test]
    fn video_threshold_is_inclusive() {
        let reqs = InteractionRequirements::from_stage_content(
            r#"{"interactionRequirements":{"videoWatchPercentage":80}}"#,
        )
        .unwrap();

        assert!(!reqs.is_satisfied_by(&video(79.0)));
        assert!(reqs.is_satisfied_by(&video(80.0)));
        assert_eq!(
            reqs.unmet(&video(79.0)),
            vec![UnmetRequirement::Video { required: 80.0, actual: Some(79.0) }]
        );
    }

    #[test]
    fn missing_telemetry_fails_a_declared_threshold() {
        let reqs = InteractionRequirements {
            scroll_completion: Some(50.0),
            ..Default::default()
        };
        assert!(!reqs.is_satisfied_by(&InteractionTelemetry::default()));
    }

    #[test]
    fn all_requirements_must_hold() {
        let reqs = InteractionRequirements {
            scroll_completion: Some(90.0),
            form_interaction: Some(true),
            ..Default::default()
        };
        let scrolled_only = InteractionTelemetry {
            scroll_percentage: Some(95.0),
            ..Default::default()
        };
        let both = InteractionTelemetry {
            scroll_percentage: Some(95.0),
            form_interacted: Some(true),
            ..Default::default()
        };

        assert_eq!(reqs.unmet(&scrolled_only), vec![UnmetRequirement::Form]);
        assert!(reqs.is_satisfied_by(&both));
    }

    #[test]
    fn zero_threshold_and_false_form_declare_nothing() {
        let reqs = InteractionRequirements {
            scroll_completion: Some(0.0),
            form_interaction: Some(false),
            ..Default::default()
        };
        assert!(reqs.is_empty());
        assert!(reqs.is_satisfied_by(&InteractionTelemetry::default()));
    }

    #[test]
    fn click_tracking_is_parsed_but_not_enforced() {
        let reqs = InteractionRequirements::from_stage_content(
            r#"{"interactionRequirements":{"clickTracking":["a","b"],"minimumInteractions":3}}"#,
        )
        .unwrap();
        assert_eq!(reqs.minimum_interactions, Some(3.0));
        assert!(reqs.is_empty());
    }

    #[test]
    fn lenient_parsing_yields_no_requirements() {
        for content in [
            "not json",
            r#"{"body":"text only"}"#,
            r#"{"interactionRequirements":"yes"}"#,
        ] {
            assert!(
                InteractionRequirements::from_stage_content(content).is_none(),
                "{content}"
            );
            let stage = stage_with(Some(content));
            assert!(InteractionRequirements::for_stage(Some(&stage)).is_empty());
        }
    }

    #[test]
    fn ill_typed_key_drops_only_itself() {
        let reqs = InteractionRequirements::from_stage_content(
            r#"{"interactionRequirements":{"videoWatchPercentage":80,"clickTracking":"all"}}"#,
        )
        .unwrap();
        assert_eq!(reqs.video_watch_percentage, Some(80.0));
        assert_eq!(reqs.click_tracking, None);
        assert!(!reqs.is_satisfied_by(&video(10.0)));

        let reqs = InteractionRequirements::from_stage_content(
            r#"{"interactionRequirements":{"videoWatchPercentage":"eighty","scrollCompletion":50}}"#,
        )
        .unwrap();
        assert_eq!(reqs.video_watch_percentage, None);
        assert_eq!(reqs.scroll_completion, Some(50.0));
    }

    #[test]
    fn form_flag_follows_truthiness() {
        let reqs = InteractionRequirements::from_stage_content(
            r#"{"interactionRequirements":{"formInteraction":1,"scrollCompletion":90}}"#,
        )
        .unwrap();
        let scrolled = InteractionTelemetry {
            scroll_percentage: Some(5.0),
            ..Default::default()
        };
        assert_eq!(reqs.form_interaction, Some(true));
        assert!(!reqs.is_satisfied_by(&scrolled));

        for off in ["0", "\"\"", "null", "false"] {
            let content = format!(r#"{{"interactionRequirements":{{"formInteraction":{off}}}}}"#);
            let reqs = InteractionRequirements::from_stage_content(&content).unwrap();
            assert!(reqs.is_empty(), "{content}");
        }
    }

    #[test]
    fn missing_stage_or_content_is_empty() {
        assert!(InteractionRequirements::for_stage(None).is_empty());
        assert!(InteractionRequirements::for_stage(Some(&stage_with(None))).is_empty());
    }

    #[test]
    fn telemetry_reads_camel_case() {
        let t: InteractionTelemetry =
            serde_json::from_str(r#"{"scrollPercentage":12.5,"formInteracted":true}"#).unwrap();
        assert_eq!(t.scroll_percentage, Some(12.5));
        assert_eq!(t.form_interacted, Some(true));
        assert_eq!(t.video_watch_percentage, None);
    }
}
