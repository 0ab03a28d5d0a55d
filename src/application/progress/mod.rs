//! Stage progress tracking and interaction validation.

pub mod service;

pub use service::ProgressService;
