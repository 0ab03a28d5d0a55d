//! Progress module: per-learner stage tracking

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
