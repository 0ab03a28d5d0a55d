//! Domain layer: entities, decision rules and repository ports.
//!
//! Nothing in here knows about HTTP or SeaORM.

pub mod content;
pub mod permission;
pub mod progress;
pub mod repositories;
pub mod user;

pub use content::{
    ContentRepository, CreateModuleDto, CreateStageDto, LearningModule, Stage, UpdateModuleDto,
    UpdateStageDto,
};
pub use permission::{
    default_role_permissions, resolve, NewUserOverride, Permission, PermissionRepository,
    RolePermission, UserPermission,
};
pub use progress::{
    InteractionRequirements, InteractionTelemetry, ProgressRepository, ProgressState,
    ProgressUpdate, StageProgress, UnmetRequirement,
};
pub use repositories::RepositoryProvider;
pub use user::{GetUserDto, UpdateUserDto, UpsertUserDto, User, UserRepository, UserRole};

pub use crate::shared::errors::{DomainError, DomainResult};
