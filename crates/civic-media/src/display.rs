//! Display state for one rendered photo.
//!
//! ```text
//! Loading -> Loaded
//! Loading -> Error | Corrupted -> (retry) -> Loading
//! ```
//!
//! Loads are capped at [`DISPLAY_MAX_ATTEMPTS`] failures per instance. Once
//! the cap is hit the instance stays in `Error`/`Corrupted` and `retry` is a
//! no-op.

use std::fmt;
use std::time::Duration;

use civic_core::defaults::{
    DISPLAY_MAX_ATTEMPTS, DISPLAY_VALIDATION_TIMEOUT_MS, MIN_DISPLAY_SOURCE_LEN,
};
use civic_core::PhotoKind;
use serde::Serialize;
use tracing::{debug, warn};

use crate::data_uri;
use crate::error::MediaError;
use crate::object_url::OBJECT_URL_PREFIX;
use crate::validate::ImageValidator;

const DIAGNOSTIC_PREFIX_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayState {
    Loading,
    Loaded,
    Error,
    Corrupted,
}

impl DisplayState {
    pub fn is_failed(self) -> bool {
        matches!(self, Self::Error | Self::Corrupted)
    }
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Loaded => write!(f, "loaded"),
            Self::Error => write!(f, "error"),
            Self::Corrupted => write!(f, "corrupted"),
        }
    }
}

/// Troubleshooting metadata shown under a photo when enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayDiagnostics {
    pub source_len: usize,
    pub source_kind: PhotoKind,
    pub last_error: Option<String>,
    pub source_prefix: String,
}

/// What the view layer should draw right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayView {
    Spinner,
    Image {
        url: String,
        clickable: bool,
    },
    Failed {
        message: String,
        corrupted: bool,
        retry_label: Option<String>,
    },
}

type ClickHandler = Box<dyn Fn(&str) + Send + Sync>;

/// One render instance of a photo.
pub struct ImageDisplay {
    source: String,
    state: DisplayState,
    failed_loads: u32,
    last_error: Option<String>,
    dimensions: Option<(u32, u32)>,
    validator: ImageValidator,
    timeout: Duration,
    show_diagnostics: bool,
    on_click: Option<ClickHandler>,
}

impl ImageDisplay {
    pub fn new(source: impl Into<String>, validator: ImageValidator) -> Self {
        Self {
            source: source.into(),
            state: DisplayState::Loading,
            failed_loads: 0,
            last_error: None,
            dimensions: None,
            validator,
            timeout: Duration::from_millis(DISPLAY_VALIDATION_TIMEOUT_MS),
            show_diagnostics: false,
            on_click: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.show_diagnostics = enabled;
        self
    }

    /// Callback invoked with the source url when a loaded image is clicked.
    pub fn on_click<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_click = Some(Box::new(handler));
        self
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn failed_loads(&self) -> u32 {
        self.failed_loads
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Decoded dimensions, when the source was an inspectable image.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    /// Validate the source and settle into `Loaded`, `Error` or `Corrupted`.
    pub async fn load(&mut self) -> DisplayState {
        self.state = DisplayState::Loading;
        match self.inspect().await {
            Ok(dimensions) => {
                self.dimensions = dimensions;
                self.last_error = None;
                self.state = DisplayState::Loaded;
            }
            Err(e) => {
                let next = if e.is_corruption() {
                    DisplayState::Corrupted
                } else {
                    DisplayState::Error
                };
                self.fail(next, e.to_string());
            }
        }
        self.state
    }

    async fn inspect(&self) -> Result<Option<(u32, u32)>, MediaError> {
        if self.source.len() < MIN_DISPLAY_SOURCE_LEN {
            return Err(MediaError::InvalidSource);
        }
        if data_uri::is_image_data_uri(&self.source) || self.source.starts_with(OBJECT_URL_PREFIX) {
            self.validator
                .dimensions(&self.source, self.timeout)
                .await
                .map(Some)
        } else {
            // External links are handed to the renderer as-is.
            Ok(None)
        }
    }

    /// Record a failure reported by the renderer after `load` succeeded.
    ///
    /// A zero natural width means the bytes decoded to nothing.
    pub fn report_load_error(&mut self, natural_width: u32) -> DisplayState {
        if natural_width == 0 {
            self.fail(DisplayState::Corrupted, MediaError::ZeroDimensions.to_string());
        } else {
            self.fail(DisplayState::Error, "Image failed to load".to_string());
        }
        self.state
    }

    fn fail(&mut self, state: DisplayState, reason: String) {
        self.failed_loads += 1;
        warn!(
            subsystem = "media",
            component = "display",
            state = %state,
            attempt = self.failed_loads,
            url_len = self.source.len(),
            error = %reason,
            "Image display failed"
        );
        self.state = state;
        self.last_error = Some(reason);
    }

    pub fn can_retry(&self) -> bool {
        self.state.is_failed() && self.failed_loads < DISPLAY_MAX_ATTEMPTS
    }

    /// Button label for the next retry, e.g. "Retry (1/3)".
    pub fn retry_label(&self) -> String {
        format!("Retry ({}/{})", self.failed_loads, DISPLAY_MAX_ATTEMPTS)
    }

    /// Go back to `Loading` and load again. Returns false, changing nothing,
    /// when not in a failed state or the attempt cap is reached.
    pub async fn retry(&mut self) -> bool {
        if !self.can_retry() {
            debug!(
                subsystem = "media",
                component = "display",
                state = %self.state,
                attempt = self.failed_loads,
                "Retry refused"
            );
            return false;
        }
        self.load().await;
        true
    }

    /// Invoke the click callback. Only loaded images are clickable.
    pub fn click(&self) -> bool {
        match (&self.on_click, self.state) {
            (Some(handler), DisplayState::Loaded) => {
                handler(&self.source);
                true
            }
            _ => false,
        }
    }

    pub fn diagnostics(&self) -> Option<DisplayDiagnostics> {
        if !self.show_diagnostics {
            return None;
        }
        Some(DisplayDiagnostics {
            source_len: self.source.len(),
            source_kind: PhotoKind::of(&self.source),
            last_error: self.last_error.clone(),
            source_prefix: self.source.chars().take(DIAGNOSTIC_PREFIX_LEN).collect(),
        })
    }

    pub fn render(&self) -> DisplayView {
        match self.state {
            DisplayState::Loading => DisplayView::Spinner,
            DisplayState::Loaded => DisplayView::Image {
                url: self.source.clone(),
                clickable: self.on_click.is_some(),
            },
            DisplayState::Error | DisplayState::Corrupted => DisplayView::Failed {
                message: self
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "Image failed to load".to_string()),
                corrupted: self.state == DisplayState::Corrupted,
                retry_label: self.can_retry().then(|| self.retry_label()),
            },
        }
    }
}

impl fmt::Debug for ImageDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageDisplay")
            .field("source_len", &self.source.len())
            .field("state", &self.state)
            .field("failed_loads", &self.failed_loads)
            .field("last_error", &self.last_error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_url::ObjectUrlRegistry;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn validator() -> ImageValidator {
        ImageValidator::new(ObjectUrlRegistry::new())
    }

    fn png_uri(width: u32, height: u32) -> String {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([40, 90, 160])))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        data_uri::encode("image/png", &buf.into_inner())
    }

    const EXTERNAL: &str = "https://storage.example.org/complaints/photos/pothole-on-main-street.jpg";

    #[tokio::test]
    async fn test_valid_data_uri_loads() {
        let mut display = ImageDisplay::new(png_uri(16, 9), validator());
        assert_eq!(display.state(), DisplayState::Loading);
        assert_eq!(display.load().await, DisplayState::Loaded);
        assert_eq!(display.dimensions(), Some((16, 9)));
    }

    #[tokio::test]
    async fn test_external_reference_is_accepted() {
        let mut display = ImageDisplay::new(EXTERNAL, validator());
        assert_eq!(display.load().await, DisplayState::Loaded);
        assert_eq!(display.dimensions(), None);
    }

    #[tokio::test]
    async fn test_short_source_is_error() {
        let mut display = ImageDisplay::new("data:image/png;base64,AAAA", validator());
        assert_eq!(display.load().await, DisplayState::Error);
        assert_eq!(display.last_error(), Some("invalid image source"));
    }

    #[tokio::test]
    async fn test_undecodable_data_uri_is_corrupted() {
        let source = format!("data:image/png;base64,{}", "QUJD".repeat(30));
        let mut display = ImageDisplay::new(source, validator());
        assert_eq!(display.load().await, DisplayState::Corrupted);
    }

    #[tokio::test]
    async fn test_render_error_classification() {
        let mut display = ImageDisplay::new(EXTERNAL, validator());
        display.load().await;
        assert_eq!(display.report_load_error(0), DisplayState::Corrupted);
        assert_eq!(display.report_load_error(640), DisplayState::Error);
        assert_eq!(display.failed_loads(), 2);
    }

    #[tokio::test]
    async fn test_retry_capped_after_three_failures() {
        let mut display = ImageDisplay::new("too-short", validator());
        display.load().await;
        assert_eq!(display.retry_label(), "Retry (1/3)");
        assert!(display.retry().await);
        assert!(display.retry().await);
        assert_eq!(display.failed_loads(), 3);
        assert!(!display.can_retry());
        assert!(!display.retry().await);
        assert_eq!(display.failed_loads(), 3);
        assert_eq!(display.state(), DisplayState::Error);
        match display.render() {
            DisplayView::Failed { retry_label, .. } => assert_eq!(retry_label, None),
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retry_refused_when_loaded() {
        let mut display = ImageDisplay::new(EXTERNAL, validator());
        display.load().await;
        assert!(!display.retry().await);
        assert_eq!(display.state(), DisplayState::Loaded);
    }

    #[tokio::test]
    async fn test_click_only_when_loaded() {
        let clicks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&clicks);
        let mut display = ImageDisplay::new(EXTERNAL, validator()).on_click(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(!display.click());
        display.load().await;
        assert!(display.click());
        display.report_load_error(10);
        assert!(!display.click());
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_diagnostics() {
        let display = ImageDisplay::new(EXTERNAL, validator());
        assert!(display.diagnostics().is_none());

        let source = png_uri(300, 300);
        let mut display = ImageDisplay::new(source.clone(), validator()).with_diagnostics(true);
        display.load().await;
        let info = display.diagnostics().unwrap();
        assert_eq!(info.source_len, source.len());
        assert_eq!(info.source_kind, PhotoKind::EmbeddedData);
        assert_eq!(info.source_prefix.len(), 100);
        assert_eq!(info.last_error, None);
    }
}
