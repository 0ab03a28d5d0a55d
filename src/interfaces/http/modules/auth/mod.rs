//! Auth module: login sync and the caller's own account

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
