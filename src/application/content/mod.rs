pub mod service;

pub use service::ContentService;
