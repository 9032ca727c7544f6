//! Core data models for the civic intake core.
//!
//! These types are shared across all civic crates. Field names serialise in
//! camelCase to match the documents held by the remote store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::defaults::MAX_PHOTOS;
use crate::error::{Error, Result};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Generate a new opaque, time-ordered id for a complaint or photo.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

// =============================================================================
// ENUMERATIONS
// =============================================================================

/// Triage status of a complaint. Any status may follow any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplaintStatus {
    #[default]
    New,
    InProgress,
    Resolved,
    Rejected,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 4] = [
        ComplaintStatus::New,
        ComplaintStatus::InProgress,
        ComplaintStatus::Resolved,
        ComplaintStatus::Rejected,
    ];

    /// Whether the complaint still needs staff attention.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::New | Self::InProgress)
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Resolved => write!(f, "resolved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for ComplaintStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "in-progress" | "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Invalid complaint status: {}", s)),
        }
    }
}

/// Urgency of a complaint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    /// Parse leniently: anything unrecognised becomes `Medium`.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

// =============================================================================
// PHOTOS
// =============================================================================

/// How a photo url carries its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhotoKind {
    /// `data:` URI with the image bytes inlined.
    EmbeddedData,
    /// Anything else: an http(s) link or a session-local object url.
    ExternalReference,
}

impl PhotoKind {
    pub fn of(url: &str) -> Self {
        if url.starts_with("data:") {
            Self::EmbeddedData
        } else {
            Self::ExternalReference
        }
    }
}

impl std::fmt::Display for PhotoKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmbeddedData => write!(f, "embedded-data"),
            Self::ExternalReference => write!(f, "external-reference"),
        }
    }
}

/// An image attached to a complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    /// Original file name, for display only.
    pub filename: String,
    /// Embedded data URI or external reference.
    pub url: String,
}

impl Photo {
    pub fn new(filename: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            filename: filename.into(),
            url: url.into(),
        }
    }

    pub fn kind(&self) -> PhotoKind {
        PhotoKind::of(&self.url)
    }
}

// =============================================================================
// COMPLAINTS
// =============================================================================

/// Geolocation captured with a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Render as `"lat, lng"` with six decimals, used as the address when
    /// the citizen shares their position instead of typing one.
    pub fn to_address(&self) -> String {
        format!("{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// A citizen-submitted civic issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub status: ComplaintStatus,
    #[serde(default)]
    pub priority: Priority,
    pub submitted_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    pub date: DateTime<Utc>,
}

impl Complaint {
    /// Create a fresh complaint: new id, status `new`, priority `medium`,
    /// dated now, no photos.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        submitted_by: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            description: description.into(),
            category: category.into(),
            address: String::new(),
            coordinates: None,
            status: ComplaintStatus::New,
            priority: Priority::Medium,
            submitted_by: submitted_by.into(),
            assigned_to: None,
            admin_notes: None,
            photos: Vec::new(),
            date: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    /// Append a photo, refusing to go past [`MAX_PHOTOS`].
    pub fn attach_photo(&mut self, photo: Photo) -> Result<()> {
        if self.photos.len() >= MAX_PHOTOS {
            return Err(Error::InvalidInput(format!(
                "Maximum {} photos allowed",
                MAX_PHOTOS
            )));
        }
        self.photos.push(photo);
        Ok(())
    }

    pub fn is_submitted_by(&self, name: &str) -> bool {
        self.submitted_by == name
    }

    /// Merge a partial update into this record.
    ///
    /// Photos past [`MAX_PHOTOS`] are dropped with a warning; call
    /// [`ComplaintPatch::validate`] first to refuse such a patch instead.
    pub fn apply(&mut self, patch: &ComplaintPatch) {
        if let Some(ref title) = patch.title {
            self.title = title.clone();
        }
        if let Some(ref description) = patch.description {
            self.description = description.clone();
        }
        if let Some(ref category) = patch.category {
            self.category = category.clone();
        }
        if let Some(ref address) = patch.address {
            self.address = address.clone();
        }
        if let Some(coordinates) = patch.coordinates {
            self.coordinates = Some(coordinates);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(ref assigned_to) = patch.assigned_to {
            self.assigned_to = Some(assigned_to.clone());
        }
        if let Some(ref admin_notes) = patch.admin_notes {
            self.admin_notes = Some(admin_notes.clone());
        }
        if let Some(ref photos) = patch.photos {
            if photos.len() > MAX_PHOTOS {
                warn!(
                    complaint_id = %self.id,
                    photo_count = photos.len(),
                    dropped = photos.len() - MAX_PHOTOS,
                    "Patch exceeds photo limit, dropping extra photos"
                );
            }
            self.photos = photos.iter().take(MAX_PHOTOS).cloned().collect();
        }
    }
}

/// Partial update for a complaint.
///
/// `id`, `submitted_by` and `date` are deliberately absent: they never change
/// after creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ComplaintStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<Photo>>,
}

impl ComplaintPatch {
    pub fn status(status: ComplaintStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn assign(staff: impl Into<String>) -> Self {
        Self {
            assigned_to: Some(staff.into()),
            ..Default::default()
        }
    }

    pub fn admin_notes(notes: impl Into<String>) -> Self {
        Self {
            admin_notes: Some(notes.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Refuse a patch that would leave a complaint over the photo limit.
    pub fn validate(&self) -> Result<()> {
        match self.photos {
            Some(ref photos) if photos.len() > MAX_PHOTOS => Err(Error::InvalidInput(format!(
                "Maximum {} photos allowed",
                MAX_PHOTOS
            ))),
            _ => Ok(()),
        }
    }
}
