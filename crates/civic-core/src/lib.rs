//! # civic-core
//!
//! Core types, traits, and abstractions for the civic issue intake core.
//!
//! This crate provides the foundational data structures (complaints, photos,
//! partial updates, analytics) and the trait seams (`DocumentStore`,
//! `GenerationBackend`) that the other civic crates depend on.

pub mod defaults;
pub mod error;
pub mod file_safety;
pub mod logging;
pub mod models;
pub mod stats;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use file_safety::{detect_image_type, is_allowed_image_type, validate_image_upload};
pub use models::*;
pub use stats::ComplaintStats;
pub use traits::*;
