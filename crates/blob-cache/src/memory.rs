//! An in-memory `BlobCache`: a capacity- and TTL-bounded map, evicting the
//! oldest entry on overflow. Used in unit tests and as the default backend
//! when no database is configured.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::blob::BundleBlob;
use crate::error::BlobCacheError;
use crate::BlobCache;

const DEFAULT_MAX_ENTRIES: usize = 10_000;
const DEFAULT_TTL_SECS: u64 = 7 * 24 * 3600;

struct Entry {
    blob: BundleBlob,
    inserted_at: Instant,
}

/// `BoundedPendingCache<BundleBlob>`-shaped blob store keyed by mainnet end
/// block, guarded by a `std::sync::Mutex` since inserts are infrequent
/// (once per reconstructed bundle) and never held across an `.await`.
pub struct InMemoryBlobCache {
    entries: Mutex<HashMap<u64, Entry>>,
    max_entries: usize,
    ttl: Duration,
}

impl InMemoryBlobCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES, DEFAULT_TTL_SECS)
    }

    pub fn with_capacity(max_entries: usize, ttl_secs: u64) -> Self {
        Self { entries: Mutex::new(HashMap::new()), max_entries, ttl: Duration::from_secs(ttl_secs) }
    }
}

impl Default for InMemoryBlobCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobCache for InMemoryBlobCache {
    async fn get(&self, key: u64) -> Result<Option<BundleBlob>, BlobCacheError> {
        let entries = self.entries.lock().expect("blob cache mutex poisoned");
        Ok(entries
            .get(&key)
            .filter(|e| e.inserted_at.elapsed() < self.ttl)
            .map(|e| e.blob.clone()))
    }

    async fn put(&self, key: u64, blob: &BundleBlob) -> Result<(), BlobCacheError> {
        let mut entries = self.entries.lock().expect("blob cache mutex poisoned");
        let now = Instant::now();
        entries.retain(|_, e| now.duration_since(e.inserted_at) < self.ttl);
        while entries.len() >= self.max_entries && !entries.is_empty() {
            let oldest = entries.iter().min_by_key(|(_, e)| e.inserted_at).map(|(k, _)| *k);
            if let Some(k) = oldest {
                entries.remove(&k);
            } else {
                break;
            }
        }
        entries.insert(key, Entry { blob: blob.clone(), inserted_at: now });
        Ok(())
    }

    async fn clear(&self) -> Result<(), BlobCacheError> {
        self.entries.lock().expect("blob cache mutex poisoned").clear();
        Ok(())
    }
}
