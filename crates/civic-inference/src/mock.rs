//! Scripted generation backend for deterministic tests.
//!
//! ```rust
//! use civic_inference::mock::MockGenerationBackend;
//!
//! let backend = MockGenerationBackend::new()
//!     .with_reply(r#"{"category": "Lighting"}"#)
//!     .with_failure("rate limited");
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use civic_core::{Error, GenerationBackend, Result};

#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Failure(String),
    RateLimited(String),
}

/// Answers prompts from a queue of scripted replies.
///
/// Once the queue is exhausted every call returns the default reply. Clones
/// share the queue and the prompt log.
#[derive(Debug, Clone)]
pub struct MockGenerationBackend {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    default_reply: Option<String>,
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerationBackend {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            default_reply: None,
        }
    }

    /// Backend that is always unreachable.
    pub fn unavailable() -> Self {
        Self::new()
    }

    /// Queue a successful reply.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        lock(&self.script).push_back(Scripted::Reply(reply.into()));
        self
    }

    /// Queue a failed call.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        lock(&self.script).push_back(Scripted::Failure(message.into()));
        self
    }

    /// Queue a call refused for quota reasons.
    pub fn with_rate_limit(self, message: impl Into<String>) -> Self {
        lock(&self.script).push_back(Scripted::RateLimited(message.into()));
        self
    }

    /// Reply used once the script runs out. Without one, calls fail.
    pub fn with_default_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = Some(reply.into());
        self
    }

    /// Every prompt received, in order.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        lock(&self.prompts).push(prompt.to_string());
        let next = lock(&self.script).pop_front();
        match next {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Failure(message)) => Err(Error::AiUnavailable(message)),
            Some(Scripted::RateLimited(message)) => Err(Error::RateLimited(message)),
            None => self
                .default_reply
                .clone()
                .ok_or_else(|| Error::AiUnavailable("mock backend has no reply".to_string())),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
