//! Report intake: photos in, complaint out.
//!
//! ```text
//! files ──► ImagePipeline ──► Photo*
//!                               │
//! draft ──► ReportAnalyzer ──► Complaint ──► ComplaintStore::add
//! ```

use std::sync::Arc;

use civic_core::defaults::{DEFAULT_SUBMITTER, MAX_PHOTOS};
use civic_core::{
    Complaint, Coordinates, DocumentStore, Error, GenerationBackend, Photo, Priority, Result,
};
use civic_inference::{AnalysisResult, GeminiBackend, ReportAnalyzer};
use civic_media::{ImageFile, ImagePipeline, ProcessingMethod, OBJECT_URL_PREFIX};
use civic_store::{ComplaintStore, JsonFileDocumentStore};
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Render coordinates as a `"lat, lng"` address with 6 decimals.
pub fn format_coordinates(lat: f64, lng: f64) -> String {
    Coordinates::new(lat, lng).to_address()
}

/// What the citizen typed into the report form.
#[derive(Debug, Clone, Default)]
pub struct ReportDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub address: String,
    pub coordinates: Option<Coordinates>,
    pub submitted_by: String,
    pub photos: Vec<Photo>,
}

impl ReportDraft {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            category: category.into(),
            submitted_by: DEFAULT_SUBMITTER.to_string(),
            ..Default::default()
        }
    }

    pub fn submitted_by(mut self, name: impl Into<String>) -> Self {
        self.submitted_by = name.into();
        self
    }

    pub fn at(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_photos(mut self, photos: impl IntoIterator<Item = Photo>) -> Self {
        self.photos.extend(photos);
        self
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.category.trim().is_empty() {
            missing.push("category");
        }
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        missing
    }
}

/// A photo accepted by the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedPhoto {
    pub photo: Photo,
    pub method: ProcessingMethod,
    pub width: u32,
    pub height: u32,
    /// False for session-local previews, which are dropped at submit.
    pub persistable: bool,
}

/// A file the pipeline refused, with the message to show the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoRejection {
    pub filename: String,
    pub reason: String,
}

/// Per-file result of [`ReportIntake::ingest_photos`], in input order.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PhotoOutcome {
    Accepted(AcceptedPhoto),
    Rejected(PhotoRejection),
}

impl PhotoOutcome {
    pub fn accepted(&self) -> Option<&AcceptedPhoto> {
        match self {
            Self::Accepted(a) => Some(a),
            Self::Rejected(_) => None,
        }
    }
}

/// A report field that was replaced by an AI suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedField {
    Category,
    Title,
    Description,
    Priority,
}

/// Result of [`ReportIntake::submit`].
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub complaint: Complaint,
    pub analysis: AnalysisResult,
    pub applied: Vec<SuggestedField>,
    /// Advisory title/description mismatch message, if any.
    pub coherence_warning: Option<String>,
    /// Filenames of session-local photos that could not be kept. Their object
    /// urls are revoked.
    pub dropped_photos: Vec<String>,
    pub persisted: bool,
    pub persist_error: Option<String>,
}

/// Ties photo processing, AI suggestions and the complaint store together.
pub struct ReportIntake<S, B> {
    store: Arc<ComplaintStore<S>>,
    pipeline: ImagePipeline,
    analyzer: ReportAnalyzer<B>,
}

impl ReportIntake<JsonFileDocumentStore, GeminiBackend> {
    /// Intake wired from environment configuration: JSON file store, Gemini
    /// backend, default image pipeline.
    pub fn from_env() -> Result<Self> {
        let store = Arc::new(ComplaintStore::new(JsonFileDocumentStore::from_env()));
        let analyzer = ReportAnalyzer::new(GeminiBackend::from_env()?);
        Ok(Self::new(store, ImagePipeline::from_env(), analyzer))
    }
}

impl<S, B> ReportIntake<S, B>
where
    S: DocumentStore + 'static,
    B: GenerationBackend,
{
    pub fn new(
        store: Arc<ComplaintStore<S>>,
        pipeline: ImagePipeline,
        analyzer: ReportAnalyzer<B>,
    ) -> Self {
        Self {
            store,
            pipeline,
            analyzer,
        }
    }

    pub fn store(&self) -> &Arc<ComplaintStore<S>> {
        &self.store
    }

    pub fn pipeline(&self) -> &ImagePipeline {
        &self.pipeline
    }

    pub fn analyzer(&self) -> &ReportAnalyzer<B> {
        &self.analyzer
    }

    /// Process a batch of picked files for a report that already has
    /// `existing` photos.
    ///
    /// The whole batch is refused when it would exceed the photo limit.
    /// Otherwise each file succeeds or fails on its own.
    #[instrument(
        skip(self, files),
        fields(subsystem = "intake", component = "photos", op = "ingest_photos", file_count = files.len())
    )]
    pub async fn ingest_photos(
        &self,
        existing: usize,
        files: &[ImageFile],
    ) -> Result<Vec<PhotoOutcome>> {
        if existing + files.len() > MAX_PHOTOS {
            return Err(Error::InvalidInput(format!(
                "Maximum {} photos allowed",
                MAX_PHOTOS
            )));
        }

        let results = join_all(files.iter().map(|f| self.pipeline.process_image(f))).await;

        let outcomes: Vec<PhotoOutcome> = files
            .iter()
            .zip(results)
            .map(|(file, result)| match result {
                Ok(image) => PhotoOutcome::Accepted(AcceptedPhoto {
                    photo: Photo::new(file.name.clone(), image.url),
                    method: image.method,
                    width: image.width,
                    height: image.height,
                    persistable: image.persistable,
                }),
                Err(e) => {
                    warn!(filename = %file.name, error = %e, "Photo rejected");
                    PhotoOutcome::Rejected(PhotoRejection {
                        filename: file.name.clone(),
                        reason: e.to_string(),
                    })
                }
            })
            .collect();

        info!(
            accepted = outcomes.iter().filter(|o| o.accepted().is_some()).count(),
            rejected = outcomes.iter().filter(|o| o.accepted().is_none()).count(),
            "Photos ingested"
        );
        Ok(outcomes)
    }

    /// Apply AI suggestions to `draft`, assemble the complaint and add it to
    /// the store.
    ///
    /// A failed remote write is reported in the outcome, not as an error; the
    /// complaint stays in the local list either way.
    #[instrument(skip(self, draft), fields(subsystem = "intake", component = "submit", op = "submit"))]
    pub async fn submit(&self, draft: ReportDraft) -> Result<SubmissionOutcome> {
        let missing = draft.missing_fields();
        if !missing.is_empty() {
            return Err(Error::InvalidInput(format!(
                "Please fill in all required fields: {}",
                missing.join(", ")
            )));
        }
        if draft.photos.len() > MAX_PHOTOS {
            return Err(Error::InvalidInput(format!(
                "Maximum {} photos allowed",
                MAX_PHOTOS
            )));
        }

        let ReportDraft {
            mut title,
            mut description,
            mut category,
            mut address,
            coordinates,
            submitted_by,
            photos,
        } = draft;

        if address.trim().is_empty() {
            if let Some(c) = coordinates {
                address = c.to_address();
            }
        }

        let analysis = self
            .analyzer
            .analyze_report(&title, &description, &address)
            .await;
        let mut applied = Vec::new();
        if adopt(&mut category, &analysis.category) {
            applied.push(SuggestedField::Category);
        }
        if adopt(&mut title, &analysis.title) {
            applied.push(SuggestedField::Title);
        }
        if adopt(&mut description, &analysis.description) {
            applied.push(SuggestedField::Description);
        }
        let priority = analysis.priority;
        if priority != Priority::default() {
            applied.push(SuggestedField::Priority);
        }

        let coherence = self
            .analyzer
            .check_title_description_match(&title, &description)
            .await;
        let coherence_warning = (!coherence.matches).then(|| {
            format!(
                "Consider improving your title/description match. Suggestions: {}",
                coherence.suggestions.join(", ")
            )
        });

        let submitted_by = if submitted_by.trim().is_empty() {
            DEFAULT_SUBMITTER.to_string()
        } else {
            submitted_by
        };
        let mut complaint = Complaint::new(title, description, category, submitted_by)
            .with_address(address)
            .with_priority(priority);
        complaint.coordinates = coordinates;

        let mut dropped_photos = Vec::new();
        for photo in photos {
            if photo.url.starts_with(OBJECT_URL_PREFIX) {
                self.pipeline.registry().revoke(&photo.url);
                warn!(filename = %photo.filename, "Dropping session-local photo from submission");
                dropped_photos.push(photo.filename);
                continue;
            }
            complaint.attach_photo(photo)?;
        }

        let (persisted, persist_error) = match self.store.add(complaint.clone()).await {
            Ok(_) => (true, None),
            Err(e) => (false, Some(e.to_string())),
        };

        info!(
            complaint_id = %complaint.id,
            applied = applied.len(),
            photo_count = complaint.photos.len(),
            persisted,
            "Report submitted"
        );

        Ok(SubmissionOutcome {
            complaint,
            analysis,
            applied,
            coherence_warning,
            dropped_photos,
            persisted,
            persist_error,
        })
    }
}

/// Replace `current` with a non-empty, different suggestion.
fn adopt(current: &mut String, suggestion: &str) -> bool {
    let suggestion = suggestion.trim();
    if suggestion.is_empty() || suggestion == current.as_str() {
        return false;
    }
    *current = suggestion.to_string();
    true
}
