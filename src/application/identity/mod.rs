//! Identity module: user accounts synced from the identity provider
//!
//! Contains the `UserService` which covers first-login upsert, profile
//! edits and administrative role/activation changes.

pub mod service;

pub use service::UserService;
