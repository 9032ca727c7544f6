//! Core traits for the civic intake abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Complaint;

// =============================================================================
// DOCUMENT STORE
// =============================================================================

/// Acknowledgement returned by a document store write.
///
/// Mirrors the remote response shape: a store may answer `ok: false` with an
/// error message instead of failing the call outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReceipt {
    pub ok: bool,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveReceipt {
    pub fn saved(id: impl Into<String>) -> Self {
        Self {
            ok: true,
            id: id.into(),
            error: None,
        }
    }

    pub fn rejected(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: id.into(),
            error: Some(error.into()),
        }
    }
}

/// Remote persistence for complaints.
///
/// No transactional guarantees are assumed. `save` on an existing id
/// overwrites the whole record.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch every stored complaint.
    async fn fetch_all(&self) -> Result<Vec<Complaint>>;

    /// Insert or overwrite a complaint.
    async fn save(&self, complaint: &Complaint) -> Result<SaveReceipt>;
}

// =============================================================================
// GENERATION BACKEND
// =============================================================================

/// Backend for free-text generation from a prompt.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a response for the prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
