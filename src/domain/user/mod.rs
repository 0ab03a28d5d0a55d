//! User aggregate
//!
//! Contains the User entity, DTOs, and repository interface.

pub mod model;
pub mod repository;

mod dto_get;
mod dto_update;
mod dto_upsert;

pub use model::{User, UserRole};

pub use dto_get::GetUserDto;
pub use dto_update::UpdateUserDto;
pub use dto_upsert::UpsertUserDto;

pub use repository::UserRepository;
