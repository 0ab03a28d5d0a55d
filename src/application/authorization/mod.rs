//! Authorization: role defaults, user overrides and permission checks.

pub mod service;

pub use service::{PermissionService, SetOverride};
