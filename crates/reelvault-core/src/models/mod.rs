//! Domain models

mod video;

pub use video::{MediaKind, Video};
