//! # civic-intake
//!
//! Submission flow for civic issue reports: photo ingestion through the image
//! pipeline, AI-assisted field suggestions, and persistence via the shared
//! complaint store.

pub mod intake;
pub mod telemetry;

pub use intake::{
    format_coordinates, AcceptedPhoto, PhotoOutcome, PhotoRejection, ReportDraft, ReportIntake,
    SubmissionOutcome, SuggestedField,
};
pub use telemetry::init_tracing;
