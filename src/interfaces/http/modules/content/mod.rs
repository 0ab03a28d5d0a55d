//! Content module: learning modules and their stages

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
