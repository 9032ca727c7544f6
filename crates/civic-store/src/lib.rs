//! # civic-store
//!
//! The complaint list shared by every view, plus the document stores it
//! persists to.
//!
//! [`ComplaintStore`] applies changes locally first and persists them after.
//! A failed remote write never rolls back local state.

pub mod json_file;
pub mod memory;
pub mod store;

pub use json_file::JsonFileDocumentStore;
pub use memory::MemoryDocumentStore;
pub use store::ComplaintStore;
