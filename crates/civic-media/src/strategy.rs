//! Image encoding strategies.
//!
//! Each strategy turns an [`ImageFile`] into a candidate [`ProcessedImage`].
//! Strategies share one contract so the pipeline can try them in order and
//! stop at the first candidate that validates.

use std::sync::Arc;

use async_trait::async_trait;
use civic_core::detect_image_type;
use tracing::debug;

use crate::canvas;
use crate::config::PipelineConfig;
use crate::data_uri;
use crate::error::MediaError;
use crate::object_url::{ObjectUrlGuard, ObjectUrlRegistry};
use crate::types::{ImageFile, ProcessedImage, ProcessingMethod};

/// Shared state handed to every strategy attempt.
#[derive(Debug, Clone)]
pub struct StrategyContext {
    pub config: PipelineConfig,
    pub registry: Arc<ObjectUrlRegistry>,
}

/// A candidate image plus the object url it depends on, if any.
///
/// Dropping the output without accepting it revokes the reference.
#[derive(Debug)]
pub struct StrategyOutput {
    pub image: ProcessedImage,
    pub reference: Option<ObjectUrlGuard>,
}

impl From<ProcessedImage> for StrategyOutput {
    fn from(image: ProcessedImage) -> Self {
        Self {
            image,
            reference: None,
        }
    }
}

/// One way of producing a displayable image from a file.
#[async_trait]
pub trait ImageStrategy: Send + Sync {
    fn method(&self) -> ProcessingMethod;

    async fn produce(
        &self,
        file: &ImageFile,
        ctx: &StrategyContext,
    ) -> Result<StrategyOutput, MediaError>;
}

/// The default chain, in priority order.
pub fn default_strategies() -> Vec<Box<dyn ImageStrategy>> {
    vec![
        Box::new(DirectRead),
        Box::new(CanvasReencode::resized()),
        Box::new(CanvasReencode::original_size()),
        Box::new(ObjectUrlFallback),
    ]
}

// =============================================================================
// DIRECT READ
// =============================================================================

/// Inline the original bytes verbatim as a data URI.
///
/// Preserves the original pixels, so it is tried first. Originals larger than
/// the display bound are refused here and left to the resizing canvas.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectRead;

#[async_trait]
impl ImageStrategy for DirectRead {
    fn method(&self) -> ProcessingMethod {
        ProcessingMethod::DirectRead
    }

    async fn produce(
        &self,
        file: &ImageFile,
        ctx: &StrategyContext,
    ) -> Result<StrategyOutput, MediaError> {
        let bytes = Arc::clone(&file.bytes);
        let claimed = file.mime_type.clone();
        let max = ctx.config.max_dimension;

        let image = tokio::task::spawn_blocking(move || -> Result<ProcessedImage, MediaError> {
            let (width, height) = canvas::read_dimensions(&bytes)?;
            if width == 0 || height == 0 {
                return Err(MediaError::ZeroDimensions);
            }
            if width > max || height > max {
                return Err(MediaError::Oversized { width, height, max });
            }
            let mime = detect_image_type(&bytes).unwrap_or(claimed.as_str());
            let url = data_uri::encode(mime, &bytes);
            Ok(ProcessedImage {
                size: url.len(),
                url,
                width,
                height,
                method: ProcessingMethod::DirectRead,
                persistable: true,
            })
        })
        .await??;

        Ok(image.into())
    }
}

// =============================================================================
// CANVAS RE-ENCODE
// =============================================================================

/// Redraw on a white canvas and re-encode as JPEG.
#[derive(Debug, Clone, Copy)]
pub struct CanvasReencode {
    resize: bool,
}

impl CanvasReencode {
    /// Downsample to the configured maximum dimension.
    pub fn resized() -> Self {
        Self { resize: true }
    }

    /// Keep the original dimensions.
    pub fn original_size() -> Self {
        Self { resize: false }
    }
}

#[async_trait]
impl ImageStrategy for CanvasReencode {
    fn method(&self) -> ProcessingMethod {
        if self.resize {
            ProcessingMethod::CanvasResized
        } else {
            ProcessingMethod::CanvasDirect
        }
    }

    async fn produce(
        &self,
        file: &ImageFile,
        ctx: &StrategyContext,
    ) -> Result<StrategyOutput, MediaError> {
        // Source is loaded through a scoped object url, released on every exit.
        let source = ctx.registry.create(Arc::clone(&file.bytes));
        let bytes = ctx
            .registry
            .resolve(source.url())
            .ok_or_else(|| MediaError::UnknownReference(source.url().to_string()))?;

        let max_dimension = self.resize.then_some(ctx.config.max_dimension);
        let quality = ctx.config.jpeg_quality;
        let task =
            tokio::task::spawn_blocking(move || canvas::render_jpeg(&bytes, max_dimension, quality));

        let timeout = ctx.config.canvas_timeout;
        let (url, width, height) = match tokio::time::timeout(timeout, task).await {
            Ok(joined) => joined??,
            Err(_) => return Err(MediaError::Timeout(timeout.as_millis() as u64)),
        };

        if url.len() < ctx.config.min_canvas_output_len || !data_uri::is_image_data_uri(&url) {
            debug!(
                subsystem = "media",
                component = "canvas",
                url_len = url.len(),
                "canvas output rejected"
            );
            return Err(MediaError::InvalidCanvasOutput);
        }

        Ok(ProcessedImage {
            size: url.len(),
            url,
            width,
            height,
            method: self.method(),
            persistable: true,
        }
        .into())
    }
}

// =============================================================================
// OBJECT URL
// =============================================================================

/// Last resort: a session-local reference to the original bytes.
///
/// Only good for immediate preview; the result is marked non-persistable.
/// Dimensions are filled in by validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectUrlFallback;

#[async_trait]
impl ImageStrategy for ObjectUrlFallback {
    fn method(&self) -> ProcessingMethod {
        ProcessingMethod::ObjectUrl
    }

    async fn produce(
        &self,
        file: &ImageFile,
        ctx: &StrategyContext,
    ) -> Result<StrategyOutput, MediaError> {
        let guard = ctx.registry.create(Arc::clone(&file.bytes));
        Ok(StrategyOutput {
            image: ProcessedImage {
                url: guard.url().to_string(),
                width: 0,
                height: 0,
                size: file.size(),
                method: ProcessingMethod::ObjectUrl,
                persistable: false,
            },
            reference: Some(guard),
        })
    }
}
