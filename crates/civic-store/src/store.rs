//! Optimistic local complaint list backed by a remote document store.
//!
//! Local state changes first and is immediately visible to readers; the
//! remote write follows. Local state is never rolled back when the remote
//! write fails, so the two can diverge until the next [`ComplaintStore::load`].
//!
//! Remote writes are serialised per store and always send the newest local
//! copy of the record, so the remote side never moves back to an older
//! version when writes complete out of order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use civic_core::{
    Complaint, ComplaintPatch, ComplaintStats, ComplaintStatus, DocumentStore, Error, Result,
    SaveReceipt,
};
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// The single writable view of the complaint list.
///
/// Construct once and share via `Arc`. Lock guards are never held across an
/// `.await`, so local mutations are applied one at a time and readers never
/// see a half-applied change.
pub struct ComplaintStore<S> {
    writer: Writer<S>,
    loading: AtomicBool,
}

/// Shared handle that persists local records one at a time.
struct Writer<S> {
    backend: Arc<S>,
    complaints: Arc<RwLock<Vec<Complaint>>>,
    turn: Arc<Mutex<()>>,
}

impl<S> Clone for Writer<S> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            complaints: Arc::clone(&self.complaints),
            turn: Arc::clone(&self.turn),
        }
    }
}

impl<S: DocumentStore> Writer<S> {
    fn read(&self) -> RwLockReadGuard<'_, Vec<Complaint>> {
        self.complaints.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Complaint>> {
        self.complaints.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Save the newest local copy of `id`, or `fallback` once it has been
    /// removed from the local list.
    async fn persist(&self, id: &str, fallback: Complaint) -> Result<SaveReceipt> {
        let _turn = self.turn.lock().await;
        let latest = {
            let complaints = self.read();
            complaints.iter().find(|c| c.id == id).cloned()
        };
        self.backend.save(&latest.unwrap_or(fallback)).await
    }
}

impl<S: DocumentStore + 'static> ComplaintStore<S> {
    /// New, empty store. Call [`load`](Self::load) to populate it.
    pub fn new(backend: S) -> Self {
        Self::with_shared(Arc::new(backend))
    }

    pub fn with_shared(backend: Arc<S>) -> Self {
        Self {
            writer: Writer {
                backend,
                complaints: Arc::new(RwLock::new(Vec::new())),
                turn: Arc::new(Mutex::new(())),
            },
            loading: AtomicBool::new(false),
        }
    }

    pub fn backend(&self) -> &S {
        &self.writer.backend
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Complaint>> {
        self.writer.read()
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Complaint>> {
        self.writer.write()
    }

    /// Replace the local list with everything in the remote store.
    ///
    /// Never fails: a fetch error is logged and leaves the list empty. The
    /// loading flag is cleared on every path.
    #[instrument(skip(self), fields(subsystem = "store", component = "complaints", op = "load"))]
    pub async fn load(&self) {
        let start = Instant::now();
        self.loading.store(true, Ordering::SeqCst);

        match self.writer.backend.fetch_all().await {
            Ok(mut fetched) => {
                fetched.sort_by(|a, b| b.date.cmp(&a.date));
                let count = fetched.len();
                *self.write() = fetched;
                info!(
                    result_count = count,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Complaints loaded"
                );
            }
            Err(e) => {
                self.write().clear();
                warn!(error = %e, "Failed to load complaints");
            }
        }

        self.loading.store(false, Ordering::SeqCst);
    }

    /// Prepend `complaint` locally, then persist it.
    ///
    /// The local entry is kept even when the remote write fails; the caller
    /// gets [`Error::RemoteWriteFailed`] and decides what to tell the user.
    #[instrument(
        skip(self, complaint),
        fields(subsystem = "store", component = "complaints", op = "add", complaint_id = %complaint.id)
    )]
    pub async fn add(&self, complaint: Complaint) -> Result<SaveReceipt> {
        self.write().insert(0, complaint.clone());
        debug!("Complaint added locally");

        let id = complaint.id.clone();
        match self.writer.persist(&id, complaint).await {
            Ok(receipt) if receipt.ok => {
                info!("Complaint persisted");
                Ok(receipt)
            }
            Ok(receipt) => {
                let reason = receipt
                    .error
                    .unwrap_or_else(|| "store rejected the write".to_string());
                warn!(error = %reason, "Remote store rejected complaint");
                Err(Error::RemoteWriteFailed(reason))
            }
            Err(e) => {
                warn!(error = %e, "Failed to persist complaint");
                Err(Error::RemoteWriteFailed(e.to_string()))
            }
        }
    }

    /// Merge `patch` into the complaint with `id` and persist the merged
    /// record in the background.
    ///
    /// Returns `None` and changes nothing when the id is unknown, when the
    /// patch fails [`ComplaintPatch::validate`], or when called outside a
    /// Tokio runtime where the write could not be scheduled. The returned
    /// handle can be awaited for the write result; dropping it does not cancel
    /// the write.
    pub fn update(
        &self,
        id: &str,
        patch: &ComplaintPatch,
    ) -> Option<JoinHandle<Result<SaveReceipt>>> {
        if let Err(e) = patch.validate() {
            warn!(
                subsystem = "store",
                component = "complaints",
                op = "update",
                complaint_id = %id,
                error = %e,
                "Refusing invalid update"
            );
            return None;
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!(
                subsystem = "store",
                component = "complaints",
                op = "update",
                complaint_id = %id,
                "No async runtime to persist the update; leaving complaint unchanged"
            );
            return None;
        };

        let merged = {
            let mut complaints = self.write();
            let complaint = complaints.iter_mut().find(|c| c.id == id)?;
            complaint.apply(patch);
            complaint.clone()
        };
        debug!(
            subsystem = "store",
            component = "complaints",
            op = "update",
            complaint_id = %id,
            "Complaint updated locally"
        );

        let writer = self.writer.clone();
        Some(runtime.spawn(async move {
            let result = writer.persist(&merged.id, merged.clone()).await;
            match &result {
                Ok(receipt) if receipt.ok => {
                    debug!(
                        subsystem = "store",
                        component = "complaints",
                        complaint_id = %merged.id,
                        "Update persisted"
                    );
                }
                Ok(receipt) => warn!(
                    subsystem = "store",
                    component = "complaints",
                    complaint_id = %merged.id,
                    error = receipt.error.as_deref().unwrap_or("rejected"),
                    "Remote store rejected update"
                ),
                Err(e) => warn!(
                    subsystem = "store",
                    component = "complaints",
                    complaint_id = %merged.id,
                    error = %e,
                    "Failed to persist update"
                ),
            }
            result
        }))
    }

    /// Remove a complaint from the local list only.
    ///
    /// The remote copy is kept and will come back on the next `load`.
    pub fn delete(&self, id: &str) -> bool {
        let removed = {
            let mut complaints = self.write();
            let before = complaints.len();
            complaints.retain(|c| c.id != id);
            complaints.len() != before
        };
        if removed {
            warn!(
                subsystem = "store",
                component = "complaints",
                op = "delete",
                complaint_id = %id,
                "Complaint removed locally; remote copy is kept"
            );
        }
        removed
    }

    pub fn set_status(
        &self,
        id: &str,
        status: ComplaintStatus,
    ) -> Option<JoinHandle<Result<SaveReceipt>>> {
        self.update(id, &ComplaintPatch::status(status))
    }

    pub fn assign(&self, id: &str, assignee: &str) -> Option<JoinHandle<Result<SaveReceipt>>> {
        self.update(id, &ComplaintPatch::assign(assignee))
    }

    pub fn set_admin_notes(
        &self,
        id: &str,
        notes: &str,
    ) -> Option<JoinHandle<Result<SaveReceipt>>> {
        self.update(id, &ComplaintPatch::admin_notes(notes))
    }

    /// Snapshot of the list, newest first.
    pub fn complaints(&self) -> Vec<Complaint> {
        self.read().clone()
    }

    pub fn get(&self, id: &str) -> Option<Complaint> {
        self.read().iter().find(|c| c.id == id).cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Complaints filed by one submitter, in list order.
    pub fn submitted_by(&self, name: &str) -> Vec<Complaint> {
        self.read()
            .iter()
            .filter(|c| c.is_submitted_by(name))
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> ComplaintStats {
        ComplaintStats::from_complaints(self.read().iter())
    }
}

impl<S> std::fmt::Debug for ComplaintStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplaintStore")
            .field(
                "len",
                &self
                    .writer
                    .complaints
                    .read()
                    .map(|c| c.len())
                    .unwrap_or_default(),
            )
            .field("loading", &self.loading.load(Ordering::SeqCst))
            .finish()
    }
}
