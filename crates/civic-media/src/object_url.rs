//! Session-local object urls.
//!
//! An object url (`blob:session/<uuid>`) points at bytes held in memory by
//! the current session. It cannot be resolved anywhere else, so it must
//! never be persisted and must be revoked once the attempt that created it
//! is done with it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;
use uuid::Uuid;

/// Scheme prefix of every object url minted by a registry.
pub const OBJECT_URL_PREFIX: &str = "blob:session/";

/// In-memory table of live object urls for one session.
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    entries: Mutex<HashMap<String, Arc<[u8]>>>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<[u8]>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mint a new url for `bytes`. The url is revoked when the guard drops
    /// unless [`ObjectUrlGuard::keep`] is called.
    pub fn create(self: &Arc<Self>, bytes: Arc<[u8]>) -> ObjectUrlGuard {
        let url = format!("{}{}", OBJECT_URL_PREFIX, Uuid::new_v4());
        self.entries().insert(url.clone(), bytes);
        trace!(subsystem = "media", component = "object_url", url = %url, "created");
        ObjectUrlGuard {
            url,
            registry: Arc::clone(self),
            armed: true,
        }
    }

    /// Bytes behind a live url.
    pub fn resolve(&self, url: &str) -> Option<Arc<[u8]>> {
        self.entries().get(url).cloned()
    }

    /// Release a url. Returns false if it was not live.
    pub fn revoke(&self, url: &str) -> bool {
        let removed = self.entries().remove(url).is_some();
        if removed {
            trace!(subsystem = "media", component = "object_url", url = %url, "revoked");
        }
        removed
    }

    /// Number of live urls.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scoped ownership of one object url.
#[derive(Debug)]
pub struct ObjectUrlGuard {
    url: String,
    registry: Arc<ObjectUrlRegistry>,
    armed: bool,
}

impl ObjectUrlGuard {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Keep the url alive for the rest of the session and return it.
    pub fn keep(mut self) -> String {
        self.armed = false;
        std::mem::take(&mut self.url)
    }
}

impl Drop for ObjectUrlGuard {
    fn drop(&mut self) {
        if self.armed {
            self.registry.revoke(&self.url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_revokes_on_drop() {
        let registry = ObjectUrlRegistry::new();
        let url = {
            let guard = registry.create(Arc::from(vec![1u8, 2, 3]));
            assert_eq!(registry.len(), 1);
            assert_eq!(registry.resolve(guard.url()).as_deref(), Some(&[1u8, 2, 3][..]));
            guard.url().to_string()
        };
        assert!(registry.is_empty());
        assert!(registry.resolve(&url).is_none());
    }

    #[test]
    fn test_keep_disarms_guard() {
        let registry = ObjectUrlRegistry::new();
        let url = registry.create(Arc::from(vec![9u8])).keep();
        assert!(url.starts_with(OBJECT_URL_PREFIX));
        assert_eq!(registry.len(), 1);
        assert!(registry.revoke(&url));
        assert!(!registry.revoke(&url));
    }

    #[test]
    fn test_urls_are_unique() {
        let registry = ObjectUrlRegistry::new();
        let a = registry.create(Arc::from(vec![1u8]));
        let b = registry.create(Arc::from(vec![1u8]));
        assert_ne!(a.url(), b.url());
        assert_eq!(registry.len(), 2);
    }
}
