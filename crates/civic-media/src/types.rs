//! Inputs and outputs of the image ingestion pipeline.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file handed over by the file picker.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    /// MIME type claimed by the picker.
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Which strategy produced an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingMethod {
    /// Original bytes inlined verbatim.
    DirectRead,
    /// Redrawn on a white canvas, downsampled, JPEG re-encoded.
    CanvasResized,
    /// Redrawn on a white canvas at original size, JPEG re-encoded.
    CanvasDirect,
    /// Session-local reference; never persist.
    ObjectUrl,
}

impl std::fmt::Display for ProcessingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectRead => write!(f, "direct-read"),
            Self::CanvasResized => write!(f, "canvas-resized"),
            Self::CanvasDirect => write!(f, "canvas-direct"),
            Self::ObjectUrl => write!(f, "object-url"),
        }
    }
}

/// An accepted image, ready to become a `Photo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
    /// Length of `url` for data URIs, original byte size for object urls.
    pub size: usize,
    pub method: ProcessingMethod,
    /// False when `url` only resolves inside the current session.
    pub persistable: bool,
}

impl ProcessedImage {
    /// Troubleshooting snapshot for support tickets and debug overlays.
    pub fn debug_info(&self, file: &ImageFile) -> ImageDebugInfo {
        ImageDebugInfo {
            file_name: file.name.clone(),
            file_size: file.size(),
            file_type: file.mime_type.clone(),
            method: self.method,
            url_length: self.url.len(),
            url_prefix: self.url.chars().take(50).collect(),
            dimensions: format!("{}x{}", self.width, self.height),
            size_kb: (self.size as f64 / 1024.0).round() as u64,
            timestamp: Utc::now(),
        }
    }
}

/// One strategy's failure, kept for the aggregated error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyFailure {
    pub method: ProcessingMethod,
    pub reason: String,
}

impl std::fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.method, self.reason)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageDebugInfo {
    pub file_name: String,
    pub file_size: usize,
    pub file_type: String,
    pub method: ProcessingMethod,
    pub url_length: usize,
    pub url_prefix: String,
    pub dimensions: String,
    pub size_kb: u64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_serializes_kebab_case() {
        let json = serde_json::to_string(&ProcessingMethod::CanvasResized).unwrap();
        assert_eq!(json, "\"canvas-resized\"");
        assert_eq!(ProcessingMethod::ObjectUrl.to_string(), "object-url");
    }

    #[test]
    fn test_debug_info() {
        let file = ImageFile::new("street.png", "image/png", vec![0u8; 2048]);
        let image = ProcessedImage {
            url: format!("data:image/png;base64,{}", "A".repeat(3000)),
            width: 640,
            height: 480,
            size: 3022,
            method: ProcessingMethod::DirectRead,
            persistable: true,
        };
        let info = image.debug_info(&file);
        assert_eq!(info.file_size, 2048);
        assert_eq!(info.dimensions, "640x480");
        assert_eq!(info.url_prefix.len(), 50);
        assert_eq!(info.size_kb, 3);
    }

    #[test]
    fn test_strategy_failure_display() {
        let failure = StrategyFailure {
            method: ProcessingMethod::CanvasDirect,
            reason: "timed out after 3000ms".to_string(),
        };
        assert_eq!(failure.to_string(), "canvas-direct: timed out after 3000ms");
    }
}
