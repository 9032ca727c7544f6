//! Decode-based validation of produced image urls.
//!
//! Decoding runs on the blocking pool under a hard timeout. A timeout is a
//! failure like any other and the caller moves on; the abandoned decode is
//! simply dropped when it finishes.

use std::sync::Arc;
use std::time::Duration;

use image::GenericImageView;
use tracing::{debug, trace};

use crate::canvas;
use crate::data_uri;
use crate::error::MediaError;
use crate::object_url::{ObjectUrlRegistry, OBJECT_URL_PREFIX};

/// Checks that a url decodes to a real, non-blank image.
#[derive(Debug, Clone)]
pub struct ImageValidator {
    registry: Arc<ObjectUrlRegistry>,
}

enum Source {
    DataUri(String),
    Bytes(Arc<[u8]>),
}

impl ImageValidator {
    pub fn new(registry: Arc<ObjectUrlRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ObjectUrlRegistry> {
        &self.registry
    }

    fn source(&self, url: &str) -> Result<Source, MediaError> {
        if data_uri::is_image_data_uri(url) {
            Ok(Source::DataUri(url.to_string()))
        } else if url.starts_with(OBJECT_URL_PREFIX) {
            self.registry
                .resolve(url)
                .map(Source::Bytes)
                .ok_or_else(|| MediaError::UnknownReference(url.to_string()))
        } else {
            Err(MediaError::InvalidSource)
        }
    }

    /// Decode and require non-zero dimensions.
    pub async fn dimensions(&self, url: &str, timeout: Duration) -> Result<(u32, u32), MediaError> {
        self.check(url, timeout, false).await
    }

    /// Decode, require non-zero dimensions and reject blank output.
    pub async fn validate(&self, url: &str, timeout: Duration) -> Result<(u32, u32), MediaError> {
        self.check(url, timeout, true).await
    }

    async fn check(
        &self,
        url: &str,
        timeout: Duration,
        reject_blank: bool,
    ) -> Result<(u32, u32), MediaError> {
        let source = self.source(url)?;
        let task = tokio::task::spawn_blocking(move || decode_and_inspect(source, reject_blank));

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => {
                let result = joined?;
                trace!(
                    subsystem = "media",
                    component = "validator",
                    success = result.is_ok(),
                    "validation finished"
                );
                result
            }
            Err(_) => {
                debug!(
                    subsystem = "media",
                    component = "validator",
                    timeout_ms = timeout.as_millis() as u64,
                    "validation timed out"
                );
                Err(MediaError::Timeout(timeout.as_millis() as u64))
            }
        }
    }
}

fn decode_and_inspect(source: Source, reject_blank: bool) -> Result<(u32, u32), MediaError> {
    let image = match source {
        Source::DataUri(url) => {
            let (_, bytes) = data_uri::decode(&url)?;
            canvas::decode(&bytes)?
        }
        Source::Bytes(bytes) => canvas::decode(&bytes)?,
    };
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(MediaError::ZeroDimensions);
    }
    if reject_blank && canvas::is_blank(&image) {
        return Err(MediaError::Blank);
    }
    Ok((width, height))
}
