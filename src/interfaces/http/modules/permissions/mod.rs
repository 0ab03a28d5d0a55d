//! Permissions module: role tables, user overrides and checks

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
