//! Reelvault API Library
//!
//! This crate provides the HTTP API handlers, middleware, and application setup.

// Module declarations
mod api_doc;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod telemetry;
pub mod utils;

// Public modules
pub mod auth;
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use setup::routes::setup_routes;
