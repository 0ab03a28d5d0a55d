//! Permission aggregate
//!
//! Role defaults, per-user overrides and the resolution rule that combines
//! them.

pub mod model;
pub mod repository;

pub use model::{
    default_role_permissions, resolve, NewUserOverride, Permission, RolePermission,
    UserPermission,
};
pub use repository::PermissionRepository;
