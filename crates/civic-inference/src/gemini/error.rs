//! Gemini-specific error handling.

use civic_core::Error;

/// Gemini error classes, derived from the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeminiErrorCode {
    /// Malformed request.
    InvalidRequest,
    /// Missing, invalid or unauthorised API key.
    AuthenticationError,
    /// Unknown model or endpoint.
    ModelNotFound,
    /// Quota or rate limit exhausted for the key.
    RateLimited,
    /// Server-side failure.
    ServerError,
    /// Anything else.
    Unknown,
}

impl GeminiErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::InvalidRequest,
            401 | 403 => Self::AuthenticationError,
            404 => Self::ModelNotFound,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Only rate limiting is retried, after rotating to the next key.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

/// Convert a Gemini failure to a civic Error.
pub fn to_civic_error(code: GeminiErrorCode, status: u16, message: &str) -> Error {
    match code {
        GeminiErrorCode::AuthenticationError => {
            Error::Config(format!("Gemini authentication failed ({}): {}", status, message))
        }
        GeminiErrorCode::ModelNotFound => {
            Error::Config(format!("Gemini model not found ({}): {}", status, message))
        }
        GeminiErrorCode::RateLimited => {
            Error::RateLimited(format!("Rate limit exceeded ({}): {}", status, message))
        }
        _ => Error::AiUnavailable(format!("Gemini returned {}: {}", status, message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_from_status() {
        assert_eq!(GeminiErrorCode::from_status(400), GeminiErrorCode::InvalidRequest);
        assert_eq!(GeminiErrorCode::from_status(403), GeminiErrorCode::AuthenticationError);
        assert_eq!(GeminiErrorCode::from_status(404), GeminiErrorCode::ModelNotFound);
        assert_eq!(GeminiErrorCode::from_status(429), GeminiErrorCode::RateLimited);
        assert_eq!(GeminiErrorCode::from_status(503), GeminiErrorCode::ServerError);
        assert_eq!(GeminiErrorCode::from_status(418), GeminiErrorCode::Unknown);
    }

    #[test]
    fn test_only_rate_limit_retries() {
        assert!(GeminiErrorCode::RateLimited.is_rate_limit());
        assert!(!GeminiErrorCode::ServerError.is_rate_limit());
        assert!(!GeminiErrorCode::AuthenticationError.is_rate_limit());
    }

    #[test]
    fn test_to_civic_error() {
        let err = to_civic_error(GeminiErrorCode::AuthenticationError, 401, "API key not valid");
        assert!(matches!(err, Error::Config(_)));
        let err = to_civic_error(GeminiErrorCode::RateLimited, 429, "quota");
        assert!(matches!(err, Error::RateLimited(_)));
        let err = to_civic_error(GeminiErrorCode::ServerError, 500, "internal");
        assert!(err.to_string().contains("Gemini returned 500"));
    }
}
