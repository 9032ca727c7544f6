//! Generative-language (Gemini) REST backend.

mod backend;
mod error;
mod types;

pub use backend::{GeminiBackend, GeminiConfig};
pub use error::{to_civic_error, GeminiErrorCode};
pub use types::*;
