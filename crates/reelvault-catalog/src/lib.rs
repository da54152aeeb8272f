//! Reelvault catalog library
//!
//! The catalog record store behind the upload pipeline. The pipeline only
//! consumes the `VideoCatalog` trait; `PgVideoCatalog` is the production
//! implementation and `MemoryVideoCatalog` backs tests and local development.

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryVideoCatalog;
pub use postgres::PgVideoCatalog;
pub use store::{CatalogError, CatalogResult, VideoCatalog};

/// Embedded migrations for the `videos` table.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
