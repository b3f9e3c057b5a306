//! The Repayment Verifier: decides the final `(relayer, repaymentChainId)`
//! a validated fill is credited under, or rejects the fill as unrepayable.
//!
//! Grounded on the oracle-trait idiom `spoke_client::DepositCountOracle`
//! already establishes for out-of-scope RPC reads: this crate never
//! talks to a chain directly, it asks a caller-supplied oracle for the one
//! fact it cannot derive from accumulated state — a transaction's sender.

use bridge_types::{Address, ChainId, Deposit, Fill};
use hub_pool::HubPoolClient;

/// Whether a chain id is backed by an EVM execution environment — the one
/// piece of chain metadata `bridge_types::ChainId` deliberately does not
/// carry (see the `ChainId representation` decision in DESIGN.md), so the
/// verifier asks an oracle the embedding binary backs with its own chain
/// registry/config, the same division of labor `DepositCountOracle` uses
/// for deposit counts.
pub trait ChainFamilyOracle {
    fn is_evm(&self, chain: ChainId) -> bool;

    /// `tx.from` for the transaction that produced `fill`, used only when
    /// `fill.relayer` is not usable on the resolved repayment chain.
    fn transaction_sender(&self, fill: &Fill) -> Option<Address>;
}

/// Verify and rewrite a single candidate fill against its matched deposit.
///
/// `hub_latest_block` is the hub's `latestBlockSearched`, the instant at
/// which pool-rebalance route presence is evaluated.
///
/// Returns `Some(rewritten fill)` or `None` when no usable relayer address
/// exists on the resolved repayment chain.
pub fn verify_repayment(
    fill: &Fill,
    deposit: &Deposit,
    hub_pool: &HubPoolClient,
    hub_latest_block: u64,
    chain_family: &dyn ChainFamilyOracle,
) -> Option<Fill> {
    // Step 1: slow fills pass through unchanged — there is no relayer to
    // repay yet, the slow-relay leaf pays out on execution.
    if fill.is_slow() {
        return Some(fill.clone());
    }

    let repayment_chain_id = resolve_repayment_chain(fill, deposit, hub_pool, hub_latest_block);

    let relayer = resolve_relayer(fill, repayment_chain_id, chain_family)?;

    Some(fill.with_repayment(relayer, repayment_chain_id))
}

fn resolve_repayment_chain(
    fill: &Fill,
    deposit: &Deposit,
    hub_pool: &HubPoolClient,
    hub_latest_block: u64,
) -> ChainId {
    if deposit.from_lite_chain {
        return deposit.origin_chain_id();
    }

    if hub_pool.has_pool_rebalance_route(fill.repayment_chain_id, hub_latest_block) {
        return fill.repayment_chain_id;
    }

    if hub_pool.has_pool_rebalance_route(deposit.destination_chain_id(), hub_latest_block) {
        deposit.destination_chain_id()
    } else {
        deposit.origin_chain_id()
    }
}

fn resolve_relayer(
    fill: &Fill,
    repayment_chain_id: ChainId,
    chain_family: &dyn ChainFamilyOracle,
) -> Option<Address> {
    if !chain_family.is_evm(repayment_chain_id) || fill.relayer.is_evm_valid() {
        return Some(fill.relayer);
    }

    let sender = chain_family.transaction_sender(fill)?;
    if sender.is_evm_valid() {
        Some(sender)
    } else {
        None
    }
}
