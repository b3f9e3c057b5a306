//! Derivation of per-chain block ranges and bundle timestamps.
//!
//! Grounded on the same "as of block X" lookup idiom `config_store`'s
//! [`config_store::VersionedHistory`] and `hub_pool`'s block/timestamp
//! resolution already use; this module only adds the range-contiguity
//! arithmetic on top.

use std::collections::HashMap;

use bridge_types::{ChainId, RootBundle};
use config_store::ConfigStoreClient;

use crate::error::BundleRangeError;

/// One chain's derived block range and bundle timestamp window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainBundleRange {
    pub start: u64,
    pub end: u64,
    pub start_time: u64,
    pub end_time: u64,
}

impl ChainBundleRange {
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains_block(&self, block: u64) -> bool {
        block >= self.start && block <= self.end
    }
}

/// Supplies a chain's header timestamp at a given block — the
/// `headerTimestamp` lookup the bundle-range formulas call. RPC transport is
/// out of scope; an embedding binary backs this with its
/// `event_store::BlockTimestamps` tables (or an equivalent live read), one
/// per chain.
pub trait HeaderTimestamps {
    fn timestamp(&self, chain: ChainId, block: u64) -> Option<u64>;
}

/// Derive `blockRanges[i]` and `bundleBlockTimestamps[chain]` for every chain
/// in `chain_id_list`, given the bundle `B`'s evaluation block numbers, the
/// immediately preceding bundle's end blocks (`prior_end_blocks`, empty for
/// the very first bundle), and each spoke's `latestBlockSearched`.
///
/// `hub_block` is the hub block the bundle `B` was evaluated/proposed at —
/// used to ask the ConfigStore which chains are disabled at that instant.
pub fn resolve_bundle_ranges(
    chain_id_list: &[ChainId],
    bundle: &RootBundle,
    hub_block: u64,
    config_store: &ConfigStoreClient,
    prior_end_blocks: &HashMap<ChainId, u64>,
    spoke_latest_block_searched: &HashMap<ChainId, u64>,
    headers: &dyn HeaderTimestamps,
) -> Result<HashMap<ChainId, ChainBundleRange>, BundleRangeError> {
    if bundle.bundle_evaluation_block_numbers.len() != chain_id_list.len() {
        return Err(BundleRangeError::ChainCountMismatch {
            got: bundle.bundle_evaluation_block_numbers.len(),
            expected: chain_id_list.len(),
        });
    }

    let disabled = config_store.get_disabled_chains(hub_block);

    let mut out = HashMap::with_capacity(chain_id_list.len());
    for (i, &chain) in chain_id_list.iter().enumerate() {
        let end = bundle.bundle_evaluation_block_numbers[i];
        let implied_start = prior_end_blocks.get(&chain).map_or(0, |&prev_end| prev_end + 1);

        let start = if disabled.contains(&chain) { end } else { implied_start };

        let spoke_latest = *spoke_latest_block_searched
            .get(&chain)
            .ok_or(BundleRangeError::MissingBlockTimestamp { chain, block: start })?;

        let start_time = header_timestamp_at(headers, chain, start.min(spoke_latest))?;

        let end_plus_one = end + 1;
        let capped = end_plus_one.min(spoke_latest);
        let advanced = end_plus_one <= spoke_latest;
        let raw_end_time = header_timestamp_at(headers, chain, capped)?;
        let end_time = if advanced { raw_end_time.saturating_sub(1) } else { raw_end_time };

        if start != 0 && start_time == 0 {
            return Err(BundleRangeError::ZeroStartTimeWithNonzeroStart { chain, start });
        }
        if end_time < start_time {
            return Err(BundleRangeError::EndTimeBeforeStartTime { chain, start_time, end_time });
        }

        out.insert(
            chain,
            ChainBundleRange { start, end, start_time, end_time },
        );
    }

    Ok(out)
}

fn header_timestamp_at(headers: &dyn HeaderTimestamps, chain: ChainId, block: u64) -> Result<u64, BundleRangeError> {
    headers
        .timestamp(chain, block)
        .ok_or(BundleRangeError::MissingBlockTimestamp { chain, block })
}
