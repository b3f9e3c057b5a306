//! The reconstruction cache: `blockRanges → result`, write-once-per-key,
//! with concurrent requests for the same key sharing the in-flight
//! computation rather than duplicating it.
//!
//! `tokio::sync::OnceCell` is the "one initializer, many awaiting readers"
//! primitive this needs: the first caller for a key runs `get_or_try_init`'s
//! closure, every other caller for the same key blocks on the same
//! `OnceCell` until it resolves, and a failed initialization leaves the
//! cell empty so the next caller retries — no permanently-poisoned entry.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use bridge_types::{BundleData, EngineError};
use tokio::sync::{Mutex, OnceCell};
use tracing::trace;

/// In-memory single-flight cache over reconstruction results. Distinct
/// from `blob_cache::BlobCache`: this cache lives only for the process's
/// lifetime and exists to collapse concurrent requests, not to persist
/// across restarts.
#[derive(Default)]
pub struct ReconstructionCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<BundleData>>>>,
}

impl ReconstructionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `compute` at most once per `key`; concurrent callers for the
    /// same key share its result. `compute`'s own error is not cached —
    /// a failed attempt leaves the slot empty for the next caller to retry.
    pub async fn get_or_compute<F, Fut>(&self, key: String, compute: F) -> Result<BundleData, EngineError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<BundleData, EngineError>>,
    {
        let cell = {
            let mut entries = self.entries.lock().await;
            entries.entry(key.clone()).or_insert_with(|| Arc::new(OnceCell::new())).clone()
        };

        match cell.get_or_try_init(compute).await {
            Ok(data) => Ok(data.clone()),
            Err(e) => {
                trace!(key, error = %e, "reconstruction failed, clearing in-flight slot for retry");
                self.entries.lock().await.remove(&key);
                Err(e)
            }
        }
    }

    /// Drop every cached result.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
