//! # civic-inference
//!
//! AI suggestions for civic reports.
//!
//! - [`gemini::GeminiBackend`]: `generateContent` client with key rotation and
//!   exponential backoff on rate limiting
//! - [`ReportAnalyzer`]: category, priority and wording suggestions plus an
//!   advisory title/description coherence check, parsed leniently
//! - [`ChatSession`]: help assistant with request pacing and canned answers
//!   while rate limited
//! - [`mock::MockGenerationBackend`]: scripted backend for tests

pub mod analyzer;
pub mod assistant;
pub mod gemini;
pub mod mock;
pub mod parse;

pub use analyzer::{AnalysisResult, AnalysisSource, MatchResult, ReportAnalyzer, ISSUE_CATEGORIES};
pub use assistant::{ChatMessage, ChatReply, ChatSender, ChatSession, ReplySource};
pub use gemini::{GeminiBackend, GeminiConfig, GeminiErrorCode};
pub use mock::MockGenerationBackend;
