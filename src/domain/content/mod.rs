//! Learning content: modules and their ordered stages.

pub mod model;
pub mod repository;

pub use model::{CreateModuleDto, CreateStageDto, LearningModule, Stage, UpdateModuleDto, UpdateStageDto};
pub use repository::ContentRepository;
