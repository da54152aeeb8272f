//! Reelvault storage library
//!
//! Storage abstraction and implementations for uploaded media. The `MediaStore`
//! trait gives the pipeline one write contract: either the object becomes fully
//! addressable under its key, or the call fails and nothing partial is
//! reachable there.
//!
//! # Storage key format
//!
//! Keys are `[orientation/]slug.ext` where the slug is 256 bits of CSPRNG
//! output in URL-safe base64 (no padding) and the extension is derived from
//! the validated content type. Keys never contain `..` or a leading `/`; key
//! generation is centralized in the `keys` module.

pub mod factory;
pub mod keys;
pub mod local;
pub mod s3;
pub mod traits;

pub use factory::create_store;
pub use local::LocalStore;
pub use reelvault_core::StorageBackend;
pub use s3::S3Store;
pub use traits::{MediaStore, StorageError, StorageResult};
