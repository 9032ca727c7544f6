//! Media-specific error handling.

use thiserror::Error;

/// Why one strategy attempt or one validation did not produce a usable image.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("invalid image source")]
    InvalidSource,

    #[error("not a base64 image data URI")]
    MalformedDataUri,

    #[error("unknown object url {0}")]
    UnknownReference(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("image has zero dimensions")]
    ZeroDimensions,

    #[error("image is blank (only background colour sampled)")]
    Blank,

    #[error("canvas contains no image data")]
    EmptyCanvas,

    #[error("invalid canvas output")]
    InvalidCanvasOutput,

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("oversized original {width}x{height} exceeds {max}px display bound")]
    Oversized { width: u32, height: u32, max: u32 },

    #[error("timed out after {0}ms")]
    Timeout(u64),

    #[error("worker failed: {0}")]
    Worker(String),
}

impl MediaError {
    /// The payload itself is broken (no pixels, or not decodable), as
    /// opposed to a load that timed out or could not be reached.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::ZeroDimensions | Self::Decode(_) | Self::MalformedDataUri
        )
    }
}

impl From<image::ImageError> for MediaError {
    fn from(e: image::ImageError) -> Self {
        MediaError::Decode(e.to_string())
    }
}

impl From<tokio::task::JoinError> for MediaError {
    fn from(e: tokio::task::JoinError) -> Self {
        MediaError::Worker(e.to_string())
    }
}
