//! Bundle-scoped output dictionaries and the hub's root bundle record.

use std::collections::HashMap;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::chain::ChainId;
use crate::deposit::Deposit;
use crate::fill::Fill;

/// `bundleDeposits` / `expiredDeposits`: nested map keyed by origin chain,
/// then by input token address.
pub type DepositsByChainAndToken = HashMap<ChainId, HashMap<Address, Vec<Deposit>>>;

/// `bundleSlowFills` / `unexecutableSlowFills`: nested map keyed by
/// destination chain, then by output token address.
pub type SlowFillsByChainAndToken = HashMap<ChainId, HashMap<Address, Vec<Deposit>>>;

/// Per-(repaymentChain, token) accumulator inside `bundleFills`.
#[derive(Debug, Clone, Default)]
pub struct FillsForToken {
    pub fills: Vec<Fill>,
    pub total_refund_amount: U256,
    pub realized_lp_fees: U256,
    pub refunds: HashMap<Address, U256>,
}

impl FillsForToken {
    pub fn new() -> Self {
        Self {
            fills: Vec::new(),
            total_refund_amount: U256::ZERO,
            realized_lp_fees: U256::ZERO,
            refunds: HashMap::new(),
        }
    }
}

/// `bundleFills`: nested map keyed by repayment chain, then by repayment
/// token address.
pub type BundleFills = HashMap<ChainId, HashMap<Address, FillsForToken>>;

/// The four-plus-one output dictionaries `loadData` produces.
/// Freshly allocated per call and handed to the caller by value — there is
/// no shared mutable state between reconstructions.
#[derive(Debug, Clone, Default)]
pub struct BundleData {
    pub bundle_deposits: DepositsByChainAndToken,
    pub expired_deposits: DepositsByChainAndToken,
    pub bundle_fills: BundleFills,
    pub bundle_slow_fills: SlowFillsByChainAndToken,
    pub unexecutable_slow_fills: SlowFillsByChainAndToken,
}

impl BundleData {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A hub-chain root bundle proposal/execution record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootBundle {
    /// Per-chain-index end blocks, in the canonical chain-id-list order.
    pub bundle_evaluation_block_numbers: Vec<u64>,
    pub pool_rebalance_root: [u8; 32],
    pub relayer_refund_root: [u8; 32],
    pub slow_relay_root: [u8; 32],
    /// Hub block at which this bundle was proposed.
    pub proposal_block: u64,
    pub challenge_period_end_timestamp: u64,
    pub total_relayer_refund_leaves: u32,
    pub executed_relayer_refund_leaves: u32,
    pub total_pool_rebalance_leaves: u32,
    pub executed_pool_rebalance_leaves: u32,
}

impl RootBundle {
    pub fn is_fully_executed(&self) -> bool {
        self.executed_relayer_refund_leaves >= self.total_relayer_refund_leaves
            && self.executed_pool_rebalance_leaves >= self.total_pool_rebalance_leaves
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_executed_requires_both_leaf_kinds() {
        let mut rb = RootBundle {
            bundle_evaluation_block_numbers: vec![100, 100],
            pool_rebalance_root: [0u8; 32],
            relayer_refund_root: [0u8; 32],
            slow_relay_root: [0u8; 32],
            proposal_block: 1,
            challenge_period_end_timestamp: 2,
            total_relayer_refund_leaves: 2,
            executed_relayer_refund_leaves: 1,
            total_pool_rebalance_leaves: 1,
            executed_pool_rebalance_leaves: 1,
        };
        assert!(!rb.is_fully_executed());
        rb.executed_relayer_refund_leaves = 2;
        assert!(rb.is_fully_executed());
    }
}
