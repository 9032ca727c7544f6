//! # civic-media
//!
//! Photo ingestion for complaint reports.
//!
//! [`ImagePipeline`] turns a picked file into a validated, displayable image
//! by trying a chain of [`ImageStrategy`] implementations in order:
//!
//! 1. direct read of the original bytes as a data URI
//! 2. canvas re-encode, downsampled to the display bound
//! 3. canvas re-encode at original size
//! 4. session-local object url (preview only, never persisted)
//!
//! [`ImageDisplay`] tracks load/retry state for one rendered photo.

pub mod canvas;
pub mod config;
pub mod data_uri;
pub mod display;
pub mod error;
pub mod object_url;
pub mod pipeline;
pub mod strategy;
pub mod types;
pub mod validate;

pub use config::PipelineConfig;
pub use display::{DisplayDiagnostics, DisplayState, DisplayView, ImageDisplay};
pub use error::MediaError;
pub use object_url::{ObjectUrlGuard, ObjectUrlRegistry, OBJECT_URL_PREFIX};
pub use pipeline::ImagePipeline;
pub use strategy::{
    default_strategies, CanvasReencode, DirectRead, ImageStrategy, ObjectUrlFallback,
    StrategyContext, StrategyOutput,
};
pub use types::{ImageDebugInfo, ImageFile, ProcessedImage, ProcessingMethod, StrategyFailure};
pub use validate::ImageValidator;
