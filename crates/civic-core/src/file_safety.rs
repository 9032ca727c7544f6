//! Upload checks for citizen photos.
//!
//! Runs before any image processing:
//! 1. Claimed MIME type against the allow-list
//! 2. Empty files
//! 3. Size ceiling

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::defaults::ALLOWED_IMAGE_TYPES;
use crate::error::{Error, Result};

static ALLOWED: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ALLOWED_IMAGE_TYPES.iter().copied().collect());

/// Whether the claimed MIME type may be uploaded.
pub fn is_allowed_image_type(mime: &str) -> bool {
    ALLOWED.contains(mime.trim().to_lowercase().as_str())
}

/// Validate an upload against the allow-list and size limits.
///
/// Returns `InvalidInput` naming the file and the first failed check.
pub fn validate_image_upload(filename: &str, mime: &str, size: usize, max_size: usize) -> Result<()> {
    if !is_allowed_image_type(mime) {
        return Err(Error::InvalidInput(format!(
            "{}: Only JPEG, PNG, WebP, and GIF images are allowed (got {})",
            filename,
            if mime.is_empty() { "unknown type" } else { mime }
        )));
    }

    if size == 0 {
        return Err(Error::InvalidInput(format!(
            "{}: File appears to be empty",
            filename
        )));
    }

    if size > max_size {
        return Err(Error::InvalidInput(format!(
            "{}: File too large: {:.1}MB exceeds limit of {:.1}MB",
            filename,
            size as f64 / 1024.0 / 1024.0,
            max_size as f64 / 1024.0 / 1024.0
        )));
    }

    Ok(())
}

/// Detect the real image type from magic bytes.
///
/// Returns the detected MIME type when the bytes are a recognised image,
/// otherwise `None` (the claimed type does not match the content).
pub fn detect_image_type(data: &[u8]) -> Option<&'static str> {
    infer::get(data)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
        .map(|kind| kind.mime_type())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::MAX_IMAGE_FILE_SIZE;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_allowed_types() {
        assert!(is_allowed_image_type("image/jpeg"));
        assert!(is_allowed_image_type("image/jpg"));
        assert!(is_allowed_image_type("IMAGE/PNG"));
        assert!(is_allowed_image_type("image/webp"));
        assert!(is_allowed_image_type("image/gif"));
        assert!(!is_allowed_image_type("image/svg+xml"));
        assert!(!is_allowed_image_type("application/pdf"));
        assert!(!is_allowed_image_type(""));
    }

    #[test]
    fn test_rejects_disallowed_type() {
        let err = validate_image_upload("doc.pdf", "application/pdf", 10, MAX_IMAGE_FILE_SIZE)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref m) if m.contains("doc.pdf")));
    }

    #[test]
    fn test_rejects_empty_file() {
        let err = validate_image_upload("a.png", "image/png", 0, MAX_IMAGE_FILE_SIZE).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_rejects_oversized_file() {
        let six_mb = 6 * 1024 * 1024;
        let err =
            validate_image_upload("big.jpg", "image/jpeg", six_mb, MAX_IMAGE_FILE_SIZE).unwrap_err();
        assert!(err.to_string().contains("6.0MB"));
    }

    #[test]
    fn test_accepts_exact_limit() {
        assert!(validate_image_upload(
            "edge.jpg",
            "image/jpeg",
            MAX_IMAGE_FILE_SIZE,
            MAX_IMAGE_FILE_SIZE
        )
        .is_ok());
    }

    #[test]
    fn test_detect_image_type() {
        assert_eq!(detect_image_type(PNG_MAGIC), Some("image/png"));
        assert_eq!(detect_image_type(b"plain text, not an image"), None);
    }
}
