//! Stage progress aggregate
//!
//! Per-(user, stage) progress rows, the not-started → in-progress →
//! completed lifecycle, and the interaction requirement check.

pub mod interaction;
pub mod model;
pub mod repository;

pub use interaction::{InteractionRequirements, InteractionTelemetry, UnmetRequirement};
pub use model::{ProgressState, ProgressUpdate, StageProgress};
pub use repository::ProgressRepository;
