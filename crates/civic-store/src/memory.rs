//! In-process document store.
//!
//! Used for tests and local demos. Failures can be switched on at runtime to
//! exercise the store's remote-failure paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use civic_core::{Complaint, DocumentStore, Error, Result, SaveReceipt};

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<String, Complaint>>,
    fail_fetch: AtomicBool,
    fail_save: AtomicBool,
    reject_save: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `complaints`.
    pub fn with_complaints(complaints: impl IntoIterator<Item = Complaint>) -> Self {
        let store = Self::new();
        {
            let mut docs = store.documents();
            for c in complaints {
                docs.insert(c.id.clone(), c);
            }
        }
        store
    }

    fn documents(&self) -> MutexGuard<'_, HashMap<String, Complaint>> {
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make `fetch_all` return an error.
    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    /// Make `save` return an error.
    pub fn set_fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    /// Make `save` answer `ok: false` without storing anything.
    pub fn set_reject_save(&self, reject: bool) {
        self.reject_save.store(reject, Ordering::SeqCst);
    }

    pub fn get(&self, id: &str) -> Option<Complaint> {
        self.documents().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.documents().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `save` calls, including failed ones.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn fetch_all(&self) -> Result<Vec<Complaint>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(Error::RemoteReadFailed("document store unavailable".into()));
        }
        Ok(self.documents().values().cloned().collect())
    }

    async fn save(&self, complaint: &Complaint) -> Result<SaveReceipt> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(Error::Request("connection refused".into()));
        }
        if self.reject_save.load(Ordering::SeqCst) {
            return Ok(SaveReceipt::rejected(&complaint.id, "quota exceeded"));
        }
        self.documents()
            .insert(complaint.id.clone(), complaint.clone());
        Ok(SaveReceipt::saved(&complaint.id))
    }
}
