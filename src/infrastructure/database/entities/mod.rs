//! Database entities module

pub mod learning_module;
pub mod module_stage;
pub mod role_permission;
pub mod stage_progress;
pub mod user;
pub mod user_permission;

pub use learning_module::Entity as LearningModule;
pub use module_stage::Entity as ModuleStage;
pub use role_permission::Entity as RolePermission;
pub use stage_progress::Entity as StageProgress;
pub use user::Entity as User;
pub use user_permission::Entity as UserPermission;
