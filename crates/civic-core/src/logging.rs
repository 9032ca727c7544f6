//! Structured logging schema and field name constants.
//!
//! All crates use these constants for consistent structured logging fields
//! so log aggregation can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Operation failed and the user is told about it |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (sampled pixels) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "media", "store", "inference", "intake"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pipeline", "display", "gemini", "analyzer"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "process_image", "add", "update", "analyze_report"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Complaint id being operated on.
pub const COMPLAINT_ID: &str = "complaint_id";

/// Photo id being operated on.
pub const PHOTO_ID: &str = "photo_id";

/// Uploaded file name.
pub const FILENAME: &str = "filename";

/// Image processing strategy name.
pub const STRATEGY: &str = "strategy";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of an uploaded file.
pub const FILE_SIZE: &str = "file_size";

/// Character length of a produced image url.
pub const URL_LEN: &str = "url_len";

/// Number of complaints returned by a fetch.
pub const RESULT_COUNT: &str = "result_count";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for generation.
pub const MODEL: &str = "model";

/// Retry attempt number (0-based).
pub const ATTEMPT: &str = "attempt";

/// Index of the credential in the rotation pool.
pub const KEY_INDEX: &str = "key_index";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
