//! # LMS service
//!
//! Backend core for a learning platform: a role-and-permission resolver
//! with per-user overrides, and a stage progress tracker that validates
//! learner interaction against per-stage requirements.
//!
//! ## Architecture
//!
//! - **domain**: entities, decision rules and repository traits
//! - **application**: services (`PermissionService`, `ProgressService`, ...)
//! - **infrastructure**: SeaORM and in-memory storage, token verification
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: errors, pagination, shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use infrastructure::{
    init_database, run_migrations, DatabaseConfig, InMemoryRepositoryProvider,
    SeaOrmRepositoryProvider,
};

pub use interfaces::http::{create_api_router, ApiState};
