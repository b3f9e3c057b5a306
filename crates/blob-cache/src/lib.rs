//! The persisted blob layer: a `BlobCache` trait the Bundle
//! Reconstructor consults before recomputing a bundle, so an Arweave-backed
//! client can be swapped in without touching the reconstruction algorithm.

pub mod blob;
pub mod error;
pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use blob::{BundleBlob, FillsForTokenView};
pub use error::BlobCacheError;
pub use memory::InMemoryBlobCache;

#[cfg(feature = "postgres")]
pub use postgres::PostgresBlobCache;

use async_trait::async_trait;

/// Persistence contract for cached bundle reconstructions. Implementations
/// are write-once-per-key from the reconstructor's perspective — concurrent writers for the same key simply race to the
/// same value, which this trait's `put` treats as an upsert.
#[async_trait]
pub trait BlobCache: Send + Sync {
    /// Fetch the blob for a bundle's mainnet end block, or `None` on a miss
    /// (recoverable — the caller recomputes from scratch).
    async fn get(&self, key: u64) -> Result<Option<BundleBlob>, BlobCacheError>;

    async fn put(&self, key: u64, blob: &BundleBlob) -> Result<(), BlobCacheError>;

    /// Drop all cached entries. Used in tests and for a manual cache bust.
    async fn clear(&self) -> Result<(), BlobCacheError>;
}
