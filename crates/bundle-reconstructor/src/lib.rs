//! The Bundle Reconstructor: `loadData` plus the two caching layers
//! around it (an in-process single-flight cache and a persisted blob
//! cache) and the engine-wide configuration and out-of-scope I/O traits
//! every other module in this crate is built from.

pub mod cache;
pub mod config;
pub mod oracle;
pub mod reconstructor;

#[cfg(feature = "metrics")]
pub mod metrics;

pub use cache::ReconstructionCache;
pub use config::{EngineConfig, INFINITE_FILL_DEADLINE};
pub use oracle::ReconstructionOracle;
pub use reconstructor::{block_ranges_key, load_data, LoadDataOutput, LoadDataParams};

use std::sync::Arc;

use blob_cache::{BlobCache, BundleBlob};
use bridge_types::{ChainId, EngineError};
use bundle_range::resolver::ChainBundleRange;
use config_store::ConfigStoreClient;
use hub_pool::HubPoolClient;
use repayment_verifier::ChainFamilyOracle;
use spoke_client::SpokeEventClient;
use std::collections::HashMap;
use tracing::{instrument, trace};

#[cfg(feature = "metrics")]
use metrics::{BLOB_CACHE_MISSES, RECONSTRUCTION_CACHE_HITS, RECONSTRUCTION_CACHE_MISSES};

/// Ties the pure [`load_data`] algorithm to both caching layers: a blob
/// cache hit short-circuits reconstruction entirely; a miss falls
/// through to the in-process [`ReconstructionCache`], and only a
/// miss there runs the algorithm, after which the result is written back
/// to the blob cache so the next proposer (or this one, after a restart)
/// can skip recomputation.
pub struct BundleReconstructor {
    pub config: EngineConfig,
    cache: ReconstructionCache,
    blob_cache: Arc<dyn BlobCache>,
}

impl BundleReconstructor {
    pub fn new(config: EngineConfig, blob_cache: Arc<dyn BlobCache>) -> Self {
        Self { config, cache: ReconstructionCache::new(), blob_cache }
    }

    /// Reconstruct the bundle for `ranges`, consulting the blob cache first
    /// when `config.attempt_blob_cache` is set, then the in-process cache,
    /// then the algorithm itself. `blob_cache_key` is the bundle's mainnet
    /// end block — the persisted document's natural key.
    #[instrument(skip_all, fields(blob_cache_key))]
    #[allow(clippy::too_many_arguments)]
    pub async fn reconstruct(
        &self,
        blob_cache_key: u64,
        ranges: &HashMap<ChainId, ChainBundleRange>,
        spokes: &HashMap<ChainId, SpokeEventClient>,
        hub_pool: &HubPoolClient,
        config_store: &ConfigStoreClient,
        hub_start_block: u64,
        hub_latest_block: u64,
        chain_family: &dyn ChainFamilyOracle,
        oracle: &dyn ReconstructionOracle,
    ) -> Result<BundleBlob, EngineError> {
        if self.config.attempt_blob_cache {
            match self.blob_cache.get(blob_cache_key).await {
                Ok(Some(blob)) => {
                    trace!(blob_cache_key, "blob cache hit, skipping reconstruction");
                    #[cfg(feature = "metrics")]
                    RECONSTRUCTION_CACHE_HITS.with_label_values(&["blob"]).inc();
                    return Ok(blob);
                }
                Ok(None) => {
                    #[cfg(feature = "metrics")]
                    BLOB_CACHE_MISSES.with_label_values(&["get"]).inc();
                }
                Err(e) => {
                    trace!(error = %e, "blob cache unavailable, falling through to live reconstruction");
                }
            }
        }

        let key = block_ranges_key(ranges);
        #[cfg(feature = "metrics")]
        RECONSTRUCTION_CACHE_MISSES.with_label_values(&["blob_cache_miss"]).inc();

        let bundle_data = self
            .cache
            .get_or_compute(key, || async {
                let params = LoadDataParams {
                    ranges,
                    spokes,
                    hub_pool,
                    config_store,
                    hub_start_block,
                    hub_latest_block,
                    chain_family,
                    oracle,
                    engine_config: &self.config,
                };
                load_data(params).await.map(|out| out.bundle_data)
            })
            .await?;

        let blob = BundleBlob::from(&bundle_data);

        if self.config.attempt_blob_cache {
            if let Err(e) = self.blob_cache.put(blob_cache_key, &blob).await {
                trace!(error = %e, "failed to persist reconstruction to the blob cache");
            }
        }

        Ok(blob)
    }

    /// Drop every cached reconstruction result.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }
}
