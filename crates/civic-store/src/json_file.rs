//! Filesystem document store: one JSON document per complaint.
//!
//! ```text
//! {base}/
//!   {id}.json
//! ```
//!
//! Writes go to a uniquely named temp file that is renamed over the target,
//! so a reader never observes a partially written document and concurrent
//! writers of one id never share a temp file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use civic_core::{defaults, Complaint, DocumentStore, Error, Result, SaveReceipt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

const EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct JsonFileDocumentStore {
    base_path: PathBuf,
}

impl JsonFileDocumentStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Store rooted at `CIVIC_STORE_DIR`, or `./data/complaints`.
    pub fn from_env() -> Self {
        let base = std::env::var(defaults::ENV_STORE_DIR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| defaults::STORE_DIR.to_string());
        Self::new(base)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn document_path(&self, id: &str) -> Result<PathBuf> {
        let safe = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !safe {
            return Err(Error::InvalidInput(format!(
                "Invalid complaint id for file storage: {:?}",
                id
            )));
        }
        Ok(self.base_path.join(format!("{}.{}", id, EXTENSION)))
    }
}

#[async_trait]
impl DocumentStore for JsonFileDocumentStore {
    async fn fetch_all(&self) -> Result<Vec<Complaint>> {
        if !fs::try_exists(&self.base_path).await? {
            return Ok(Vec::new());
        }

        let mut complaints = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let bytes = fs::read(&path).await?;
            match serde_json::from_slice::<Complaint>(&bytes) {
                Ok(c) => complaints.push(c),
                Err(e) => {
                    warn!(
                        subsystem = "store",
                        component = "json_file",
                        path = %path.display(),
                        error = %e,
                        "Skipping unreadable complaint document"
                    );
                }
            }
        }
        debug!(
            subsystem = "store",
            component = "json_file",
            result_count = complaints.len(),
            "json_file: fetch_all"
        );
        Ok(complaints)
    }

    async fn save(&self, complaint: &Complaint) -> Result<SaveReceipt> {
        let full_path = self.document_path(&complaint.id)?;
        let data = serde_json::to_vec_pretty(complaint)?;
        debug!(
            subsystem = "store",
            component = "json_file",
            complaint_id = %complaint.id,
            file_size = data.len(),
            "json_file: save"
        );

        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            warn!(base = %self.base_path.display(), error = %e, "json_file: create_dir_all failed");
            e
        })?;

        let temp_path = self
            .base_path
            .join(format!("{}.{}.tmp", complaint.id, Uuid::new_v4()));
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &full_path).await {
            let _ = fs::remove_file(&temp_path).await;
            warn!(
                from = %temp_path.display(),
                to = %full_path.display(),
                error = %e,
                "json_file: rename failed"
            );
            return Err(e.into());
        }

        Ok(SaveReceipt::saved(&complaint.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileDocumentStore::new(dir.path().join("not-created"));
        assert!(store.fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_fetch() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileDocumentStore::new(dir.path());
        let c = Complaint::new("Overflowing bin", "Bin not emptied for days", "Waste Management", "Meera");

        let receipt = store.save(&c).await.unwrap();
        assert!(receipt.ok);
        assert!(dir.path().join(format!("{}.json", c.id)).exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        let fetched = store.fetch_all().await.unwrap();
        assert_eq!(fetched, vec![c]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_of_one_id() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileDocumentStore::new(dir.path());
        let mut long = Complaint::new("Leak", "Water main leaking", "Water & Utilities", "Kiran");
        long.admin_notes = Some("x".repeat(20_000));
        let mut short = long.clone();
        short.admin_notes = Some("short".into());

        for _ in 0..20 {
            let (a, b) = tokio::join!(store.save(&long), store.save(&short));
            assert!(a.unwrap().ok);
            assert!(b.unwrap().ok);
        }

        let fetched = store.fetch_all().await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert!(fetched[0] == long || fetched[0] == short);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_unsafe_id_rejected() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileDocumentStore::new(dir.path());
        let c = Complaint::new("t", "d", "c", "s").with_id("../escape");
        assert!(matches!(store.save(&c).await, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_corrupt_document_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.json"), b"{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        let store = JsonFileDocumentStore::new(dir.path());
        let c = Complaint::new("Leak", "Water main leaking", "Water & Utilities", "Kiran");
        store.save(&c).await.unwrap();

        let fetched = store.fetch_all().await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].id, c.id);
    }
}
