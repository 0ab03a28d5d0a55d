//! Application layer: use-case services over the repository ports.
//!
//! Every service holds an `Arc<dyn RepositoryProvider>` so the same code
//! runs against SeaORM in production and the in-memory provider in tests.

pub mod authorization;
pub mod content;
pub mod identity;
pub mod progress;

pub use authorization::PermissionService;
pub use content::ContentService;
pub use identity::UserService;
pub use progress::ProgressService;
