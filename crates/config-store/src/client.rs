//! The ConfigStore state machine itself.
//!
//! Typed, validated state built incrementally from raw hub events, tracking
//! "as of when" a value is valid rather than keeping a single unversioned
//! snapshot.
//!
//! "at: time" lookups are
//! intentionally not implemented here: resolving a timestamp to a hub block
//! is the Hub/Spoke event client's job (`event-store`'s `BlockTimestamps`).
//! Callers resolve time to block first, then call the block-indexed methods
//! below — this keeps the version/disabled-chains/rate-model state machine
//! free of a timestamp-to-block search dependency it would otherwise need
//! to duplicate.

use std::collections::HashMap;

use alloy_primitives::U256;
use bridge_types::{Address, ChainId, EventCoordinates};
use tracing::{trace, warn};

use crate::error::ConfigStoreError;
use crate::history::VersionedHistory;
use crate::payload::{self, RateModel, TokenConfig};

const SECONDS_PER_DAY: f64 = 24.0 * 3600.0;

#[derive(Debug, Clone, Default)]
struct TokenHistory {
    rate_model: VersionedHistory<RateModel>,
    transfer_threshold: VersionedHistory<U256>,
    spoke_target_balances: VersionedHistory<HashMap<ChainId, U256>>,
    route_rate_models: VersionedHistory<HashMap<(ChainId, ChainId), RateModel>>,
}

/// Recognized `UpdatedGlobalConfig` keys, plus
/// `LITE_CHAIN_IDS`: the spoke update loop needs a ConfigStore-sourced
/// answer for "is this chain lite at this block", so this follows the
/// same list-of-chain-ids shape `DISABLED_CHAINS` already uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GlobalConfigKey {
    Version,
    DisabledChains,
    LiteChainIds,
    MaxRelayerRepaymentLeafSize,
    MaxPoolRebalanceLeafSize,
}

impl GlobalConfigKey {
    fn parse(key: &str) -> Option<Self> {
        match key {
            "VERSION" => Some(Self::Version),
            "DISABLED_CHAINS" => Some(Self::DisabledChains),
            "LITE_CHAIN_IDS" => Some(Self::LiteChainIds),
            "MAX_RELAYER_REPAYMENT_LEAF_SIZE" => Some(Self::MaxRelayerRepaymentLeafSize),
            "MAX_POOL_REBALANCE_LEAF_SIZE" => Some(Self::MaxPoolRebalanceLeafSize),
            _ => None,
        }
    }
}

/// The full ConfigStore state machine for one hub-chain deployment.
#[derive(Debug, Clone, Default)]
pub struct ConfigStoreClient {
    version_history: VersionedHistory<u32>,
    disabled_chains_history: VersionedHistory<Vec<ChainId>>,
    lite_chains_history: VersionedHistory<Vec<ChainId>>,
    max_relayer_repayment_leaf_size: VersionedHistory<u64>,
    max_pool_rebalance_leaf_size: VersionedHistory<u64>,
    token_histories: HashMap<Address, TokenHistory>,
}

impl ConfigStoreClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an `UpdatedGlobalConfig{key, value}` event. Unrecognized keys
    /// are logged and ignored rather than treated as an error — the
    /// ConfigStore contract can carry keys this engine has no use for.
    pub fn apply_global_update(&mut self, coordinates: EventCoordinates, key: &str, raw_value: &str) {
        let Some(parsed_key) = GlobalConfigKey::parse(key) else {
            trace!(key, "ignoring unrecognized global config key");
            return;
        };

        match parsed_key {
            GlobalConfigKey::Version => match raw_value.parse::<u32>() {
                Ok(version) => {
                    let current = self.version_history.latest().copied().unwrap_or(0);
                    if version > current {
                        self.version_history.push(coordinates, version);
                    } else {
                        trace!(version, current, "ignoring non-increasing VERSION update");
                    }
                }
                Err(_) => warn!(raw_value, "malformed VERSION payload, ignoring"),
            },
            GlobalConfigKey::DisabledChains => match payload::parse_disabled_chains(raw_value) {
                Ok(chains) => self.disabled_chains_history.push(coordinates, chains),
                Err(e) => warn!(error = %e, "malformed DISABLED_CHAINS payload, ignoring"),
            },
            GlobalConfigKey::LiteChainIds => match payload::parse_chain_id_list(raw_value) {
                Ok(chains) => self.lite_chains_history.push(coordinates, chains),
                Err(e) => warn!(error = %e, "malformed LITE_CHAIN_IDS payload, ignoring"),
            },
            GlobalConfigKey::MaxRelayerRepaymentLeafSize => match raw_value.parse::<u64>() {
                Ok(v) => self.max_relayer_repayment_leaf_size.push(coordinates, v),
                Err(_) => warn!(raw_value, "malformed MAX_RELAYER_REPAYMENT_LEAF_SIZE payload, ignoring"),
            },
            GlobalConfigKey::MaxPoolRebalanceLeafSize => match raw_value.parse::<u64>() {
                Ok(v) => self.max_pool_rebalance_leaf_size.push(coordinates, v),
                Err(_) => warn!(raw_value, "malformed MAX_POOL_REBALANCE_LEAF_SIZE payload, ignoring"),
            },
        }
    }

    /// Apply an `UpdatedTokenConfig{token, value}` event. A malformed
    /// payload within the 24-hour warning horizon (relative to
    /// `current_block`, using `avg_block_time_secs` to convert hours to
    /// blocks) is logged at `warn`; an older malformed payload is dropped
    /// silently, matching how stale formatting mistakes in long-tail
    /// history are expected and not worth re-surfacing on every replay.
    pub fn apply_token_update(
        &mut self,
        token: Address,
        coordinates: EventCoordinates,
        raw_json: &str,
        current_block: u64,
        avg_block_time_secs: f64,
    ) {
        match payload::parse_token_config(raw_json) {
            Ok(config) => self.merge_token_config(token, coordinates, config),
            Err(e) => self.handle_malformed_token_update(coordinates.block, current_block, avg_block_time_secs, e),
        }
    }

    fn handle_malformed_token_update(
        &self,
        event_block: u64,
        current_block: u64,
        avg_block_time_secs: f64,
        error: ConfigStoreError,
    ) {
        let horizon_blocks = if avg_block_time_secs > 0.0 {
            (SECONDS_PER_DAY / avg_block_time_secs).round() as u64
        } else {
            0
        };
        let within_horizon = current_block.saturating_sub(event_block) <= horizon_blocks;
        if within_horizon {
            warn!(block = event_block, error = %error, "malformed token config payload within warning horizon");
        } else {
            trace!(block = event_block, error = %error, "dropping stale malformed token config payload");
        }
    }

    fn merge_token_config(&mut self, token: Address, coordinates: EventCoordinates, config: TokenConfig) {
        let history = self.token_histories.entry(token).or_default();
        if let Some(rate_model) = config.rate_model {
            history.rate_model.push(coordinates.clone(), rate_model);
        }
        if let Some(threshold) = config.transfer_threshold {
            history.transfer_threshold.push(coordinates.clone(), threshold);
        }
        if let Some(balances) = config.spoke_target_balances {
            history.spoke_target_balances.push(coordinates.clone(), balances);
        }
        if let Some(routes) = config.route_rate_models {
            history.route_rate_models.push(coordinates, routes);
        }
    }

    /// `getRateModel(l1Token, originChain, destinationChain, block)`: a
    /// route-specific override takes precedence over the token's default
    /// rate model.
    pub fn get_rate_model(
        &self,
        token: Address,
        origin: ChainId,
        destination: ChainId,
        block: u64,
    ) -> Option<RateModel> {
        let history = self.token_histories.get(&token)?;
        if let Some(routes) = history.route_rate_models.at_or_before(block) {
            if let Some(model) = routes.get(&(origin, destination)) {
                return Some(model.clone());
            }
        }
        history.rate_model.at_or_before(block).cloned()
    }

    /// `getDisabledChains(block)`.
    pub fn get_disabled_chains(&self, block: u64) -> Vec<ChainId> {
        self.disabled_chains_history
            .at_or_before(block)
            .cloned()
            .unwrap_or_default()
    }

    /// `getEnabledChainsInRange(from, to, candidates)`: a candidate chain is
    /// enabled for the range if it is not in the disabled set evaluated at
    /// the range's end block — bundle ranges are evaluated at their end
    /// block throughout this engine, so that is the authoritative
    /// instant for an enable/disable decision.
    pub fn get_enabled_chains_in_range(&self, _from: u64, to: u64, candidates: &[ChainId]) -> Vec<ChainId> {
        let disabled = self.get_disabled_chains(to);
        candidates
            .iter()
            .copied()
            .filter(|c| !disabled.contains(c))
            .collect()
    }

    /// `LITE_CHAIN_IDS` at or before `block`.
    pub fn get_lite_chains(&self, block: u64) -> Vec<ChainId> {
        self.lite_chains_history.at_or_before(block).cloned().unwrap_or_default()
    }

    pub fn is_lite_chain(&self, chain: ChainId, block: u64) -> bool {
        self.get_lite_chains(block).contains(&chain)
    }

    /// `getConfigStoreVersion(at: block)`. Resolve a timestamp to a block
    /// before calling this if the caller only has a timestamp.
    pub fn get_config_store_version(&self, block: u64) -> u32 {
        self.version_history.at_or_before(block).copied().unwrap_or(0)
    }

    /// `getSpokeTargetBalances(l1Token, chain, block)`.
    pub fn get_spoke_target_balances(
        &self,
        token: Address,
        chain: ChainId,
        block: u64,
    ) -> Option<U256> {
        self.token_histories
            .get(&token)?
            .spoke_target_balances
            .at_or_before(block)?
            .get(&chain)
            .copied()
    }
}
