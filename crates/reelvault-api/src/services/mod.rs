pub mod probe;
pub mod upload;
