//! Centralized default constants for the civic intake core.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// COMPLAINTS
// =============================================================================

/// Maximum number of photos attached to a single complaint.
pub const MAX_PHOTOS: usize = 5;

/// Display name used when the submitting user is unknown.
pub const DEFAULT_SUBMITTER: &str = "Citizen User";

// =============================================================================
// IMAGE INGESTION
// =============================================================================

/// Upload ceiling in bytes (5 MiB).
pub const MAX_IMAGE_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Longest side, in pixels, after the resizing canvas strategy.
pub const IMAGE_MAX_DIMENSION: u32 = 1200;

/// JPEG quality (0-100) used by the canvas re-encode strategies.
pub const JPEG_QUALITY: u8 = 90;

/// Timeout for validating one strategy's output.
pub const IMAGE_VALIDATION_TIMEOUT_MS: u64 = 3_000;

/// Bound on one strategy producing a candidate, before validation.
pub const IMAGE_STRATEGY_TIMEOUT_MS: u64 = 15_000;

/// Canvas output shorter than this is treated as a failed encode.
pub const MIN_CANVAS_OUTPUT_LEN: usize = 1_000;

/// Allowed upload MIME types. `image/jpg` is a common non-standard alias.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/gif",
];

// =============================================================================
// IMAGE DISPLAY
// =============================================================================

/// Total load attempts a display instance may make before giving up.
pub const DISPLAY_MAX_ATTEMPTS: u32 = 3;

/// Timeout for validating an embedded source before display.
pub const DISPLAY_VALIDATION_TIMEOUT_MS: u64 = 5_000;

/// Sources shorter than this cannot be a real image reference.
pub const MIN_DISPLAY_SOURCE_LEN: usize = 50;

// =============================================================================
// GENERATIVE LANGUAGE ENDPOINT
// =============================================================================

/// Base URL of the generative-language API.
pub const GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default text-generation model.
pub const GEMINI_MODEL: &str = "gemini-pro-latest";

/// Retries after a rate-limited response (so at most 4 requests).
pub const AI_MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff between rate-limited retries.
pub const AI_BACKOFF_BASE_MS: u64 = 2_000;

/// Per-request timeout in seconds.
pub const AI_TIMEOUT_SECS: u64 = 60;

/// Confidence reported when the response parsed as a JSON object.
pub const AI_CONFIDENCE_STRUCTURED: f32 = 0.8;

/// Confidence reported when fields were recovered by pattern matching.
pub const AI_CONFIDENCE_EXTRACTED: f32 = 0.5;

// =============================================================================
// ASSISTANT
// =============================================================================

/// Minimum spacing between two assistant requests.
pub const CHAT_MIN_INTERVAL_MS: u64 = 2_000;

/// Earlier messages included in an assistant prompt.
pub const CHAT_HISTORY_MESSAGES: usize = 4;

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

pub const ENV_GEMINI_BASE_URL: &str = "GEMINI_BASE_URL";
pub const ENV_GEMINI_MODEL: &str = "GEMINI_MODEL";
pub const ENV_GEMINI_API_KEYS: &str = "GEMINI_API_KEYS";
pub const ENV_GEMINI_MAX_RETRIES: &str = "GEMINI_MAX_RETRIES";
pub const ENV_GEMINI_BACKOFF_MS: &str = "GEMINI_BACKOFF_MS";
pub const ENV_GEMINI_TIMEOUT: &str = "GEMINI_TIMEOUT";

pub const ENV_IMAGE_MAX_DIMENSION: &str = "CIVIC_IMAGE_MAX_DIMENSION";
pub const ENV_IMAGE_JPEG_QUALITY: &str = "CIVIC_IMAGE_JPEG_QUALITY";
pub const ENV_IMAGE_MAX_FILE_SIZE: &str = "CIVIC_IMAGE_MAX_FILE_SIZE";
pub const ENV_IMAGE_VALIDATION_TIMEOUT_MS: &str = "CIVIC_IMAGE_VALIDATION_TIMEOUT_MS";

pub const ENV_STORE_DIR: &str = "CIVIC_STORE_DIR";

/// Default directory for the JSON file document store.
pub const STORE_DIR: &str = "./data/complaints";
