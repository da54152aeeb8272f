//! Reelvault core library
//!
//! Shared configuration, error types, and domain models used by the catalog,
//! storage, and API crates.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
