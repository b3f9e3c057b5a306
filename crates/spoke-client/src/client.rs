//! The Spoke Event Client itself: one instance per chain, accumulating
//! deposits, fills, and slow-fill requests in arrival order and answering
//! the Bundle Reconstructor's per-chain, per-hash queries.

use std::collections::HashMap;

use alloy_primitives::U256;
use bridge_types::{ChainId, Deposit, EngineError, Fill, RelayDataHash, SlowFillRequest};
use tracing::trace;

use crate::search::{bounded_probe_window, DepositCountOracle};
use crate::speed_up::{select_applicable, SpeedUp};

/// The `[from, to]` window one update pass reads new events from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRange {
    pub from: u64,
    pub to: u64,
}

/// One chain's spoke state, as seen by the accounting engine.
#[derive(Debug, Clone)]
pub struct SpokeEventClient {
    chain: ChainId,
    deployment_block: u64,
    latest_block_searched: u64,
    first_block_to_search: u64,

    deposits_by_hash: HashMap<RelayDataHash, Vec<Deposit>>,
    deposit_hashes_by_destination: HashMap<ChainId, Vec<RelayDataHash>>,

    fills_by_hash: HashMap<RelayDataHash, Fill>,
    fill_hashes_by_origin: HashMap<ChainId, Vec<RelayDataHash>>,

    slow_fill_requests_by_hash: HashMap<RelayDataHash, SlowFillRequest>,
    slow_fill_request_hashes_by_origin: HashMap<ChainId, Vec<RelayDataHash>>,

    speed_ups_by_deposit_id: HashMap<U256, Vec<SpeedUp>>,
}

impl SpokeEventClient {
    pub fn new(chain: ChainId, deployment_block: u64) -> Self {
        Self {
            chain,
            deployment_block,
            latest_block_searched: deployment_block,
            first_block_to_search: deployment_block,
            deposits_by_hash: HashMap::new(),
            deposit_hashes_by_destination: HashMap::new(),
            fills_by_hash: HashMap::new(),
            fill_hashes_by_origin: HashMap::new(),
            slow_fill_requests_by_hash: HashMap::new(),
            slow_fill_request_hashes_by_origin: HashMap::new(),
            speed_ups_by_deposit_id: HashMap::new(),
        }
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    pub fn deployment_block(&self) -> u64 {
        self.deployment_block
    }

    pub fn latest_block_searched(&self) -> u64 {
        self.latest_block_searched
    }

    pub fn first_block_to_search(&self) -> u64 {
        self.first_block_to_search
    }

    /// `searchConfig = {from: firstBlockToSearch, to: min(configuredTo, latestHeadBlock)}`.
    pub fn search_range(&self, configured_to: Option<u64>, latest_head_block: u64) -> SearchRange {
        let to = configured_to.map_or(latest_head_block, |c| c.min(latest_head_block));
        SearchRange { from: self.first_block_to_search, to }
    }

    /// Advance `firstBlockToSearch` and `latestBlockSearched` after a
    /// completed update pass over `range`.
    pub fn advance(&mut self, range: SearchRange) {
        self.latest_block_searched = range.to;
        self.first_block_to_search = range.to + 1;
    }

    /// Ingest a deposit. An exact duplicate `(coordinates, payload)` is
    /// dropped silently; a second arrival sharing the `RelayDataHash` with
    /// different coordinates is recorded as a duplicate deposit.
    pub fn ingest_deposit(&mut self, deposit: Deposit) {
        let hash = deposit.hash();
        let list = self.deposits_by_hash.entry(hash).or_default();

        if list.iter().any(|d| d.coordinates == deposit.coordinates) {
            trace!(%hash, "ignoring exact duplicate deposit");
            return;
        }

        let is_first_arrival = list.is_empty();
        let destination = deposit.destination_chain_id();
        list.push(deposit);

        if is_first_arrival {
            self.deposit_hashes_by_destination.entry(destination).or_default().push(hash);
        }
    }

    /// Ingest a fill. A second arrival for a hash that already has a fill
    /// is `DuplicateEvent` unless it is an exact repeat of the same event.
    pub fn ingest_fill(&mut self, fill: Fill) -> Result<(), EngineError> {
        let hash = fill.hash();
        if let Some(existing) = self.fills_by_hash.get(&hash) {
            if existing.coordinates == fill.coordinates {
                trace!(%hash, "ignoring exact duplicate fill");
                return Ok(());
            }
            return Err(EngineError::DuplicateEvent { kind: "fill", hash });
        }
        self.fill_hashes_by_origin.entry(fill.origin_chain_id()).or_default().push(hash);
        self.fills_by_hash.insert(hash, fill);
        Ok(())
    }

    /// Ingest a slow-fill request, under the same duplicate policy as fills.
    pub fn ingest_slow_fill_request(&mut self, request: SlowFillRequest) -> Result<(), EngineError> {
        let hash = request.hash();
        if let Some(existing) = self.slow_fill_requests_by_hash.get(&hash) {
            if existing.coordinates == request.coordinates {
                trace!(%hash, "ignoring exact duplicate slow-fill request");
                return Ok(());
            }
            return Err(EngineError::DuplicateEvent { kind: "slow_fill_request", hash });
        }
        self.slow_fill_request_hashes_by_origin.entry(request.origin_chain_id()).or_default().push(hash);
        self.slow_fill_requests_by_hash.insert(hash, request);
        Ok(())
    }

    pub fn record_speed_up(&mut self, speed_up: SpeedUp) {
        self.speed_ups_by_deposit_id.entry(speed_up.deposit_id).or_default().push(speed_up);
    }

    /// The speed-up a relayer should honor for `deposit_id`, given the
    /// deposit's current `output_amount` — `None` if no candidate beats it.
    pub fn applicable_speed_up(&self, deposit_id: U256, current_output_amount: U256) -> Option<&SpeedUp> {
        let candidates = self.speed_ups_by_deposit_id.get(&deposit_id)?;
        select_applicable(candidates, current_output_amount)
    }

    /// All deposits destined for `destination`, grouped by `RelayDataHash`,
    /// in ascending first-arrival order. Each hash's inner slice is the
    /// duplicate list in arrival order — `[0]` is the canonical deposit.
    pub fn deposits_to_destination(&self, destination: ChainId) -> Vec<(RelayDataHash, &[Deposit])> {
        self.deposit_hashes_by_destination
            .get(&destination)
            .map(|hashes| hashes.iter().map(|h| (*h, self.deposits_by_hash[h].as_slice())).collect())
            .unwrap_or_default()
    }

    pub fn deposits_for_hash(&self, hash: RelayDataHash) -> &[Deposit] {
        self.deposits_by_hash.get(&hash).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fills originating from `origin`, in ascending arrival order.
    pub fn fills_from_origin(&self, origin: ChainId) -> Vec<&Fill> {
        self.fill_hashes_by_origin
            .get(&origin)
            .map(|hashes| hashes.iter().filter_map(|h| self.fills_by_hash.get(h)).collect())
            .unwrap_or_default()
    }

    pub fn fill_for_hash(&self, hash: RelayDataHash) -> Option<&Fill> {
        self.fills_by_hash.get(&hash)
    }

    pub fn slow_fill_request_for_hash(&self, hash: RelayDataHash) -> Option<&SlowFillRequest> {
        self.slow_fill_requests_by_hash.get(&hash)
    }

    /// Slow-fill requests originating from `origin`, in ascending arrival
    /// order — the mirror of [`fills_from_origin`](Self::fills_from_origin)
    /// Phase 3 of reconstruction sweeps over.
    pub fn slow_fill_requests_from_origin(&self, origin: ChainId) -> Vec<&SlowFillRequest> {
        self.slow_fill_request_hashes_by_origin
            .get(&origin)
            .map(|hashes| hashes.iter().filter_map(|h| self.slow_fill_requests_by_hash.get(h)).collect())
            .unwrap_or_default()
    }

    /// `findDeposit(depositId)`: an in-memory hit short-circuits the search;
    /// otherwise narrow a candidate block window via bounded binary search.
    /// Materializing a deposit outside what this client has already
    /// ingested requires an RPC log read, which is out of scope here — a
    /// caller that needs it performs the read against the narrowed window
    /// and re-ingests the result.
    pub fn find_deposit(
        &self,
        deposit_id: U256,
        oracle: &dyn DepositCountOracle,
        max_probes: u32,
    ) -> Option<&Deposit> {
        if let Some(found) = self.find_deposit_in_memory(deposit_id) {
            return Some(found);
        }
        let deposit_id_u64: u64 = deposit_id.try_into().unwrap_or(u64::MAX);
        let _window = bounded_probe_window(
            self.deployment_block,
            self.latest_block_searched,
            deposit_id_u64,
            oracle,
            max_probes,
        );
        None
    }

    fn find_deposit_in_memory(&self, deposit_id: U256) -> Option<&Deposit> {
        self.deposits_by_hash
            .values()
            .flat_map(|list| list.iter())
            .find(|d| d.deposit_id() == deposit_id)
    }
}
