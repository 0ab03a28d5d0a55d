//! Feature-oriented HTTP modules, each with its own DTOs and handlers.

pub mod auth;
pub mod content;
pub mod health;
pub mod metrics;
pub mod permissions;
pub mod progress;
pub mod request_id;
pub mod users;
