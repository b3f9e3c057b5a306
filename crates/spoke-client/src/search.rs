//! Bounded historical deposit search.
//!
//! `numberOfDeposits(blockTag)` is an on-chain view, so reading it is the
//! same out-of-scope RPC boundary every other live chain read in this
//! engine crosses. What belongs in this crate is the bounded-probe search
//! algorithm itself: an iterative binary search capped at a small probe
//! count, never recursive, that narrows a deposit id down to the block
//! window it was emitted in.

/// Supplies `numberOfDeposits(blockTag)` — the count of deposits emitted on
/// or before `block`. Implemented by the embedding binary's chain reader;
/// a fixture implementation for tests only needs to know the deposit count
/// at a handful of probed blocks.
pub trait DepositCountOracle {
    fn number_of_deposits(&self, block: u64) -> u64;
}

/// Binary-search `[deployment_block, latest_block_searched]` for the
/// smallest block at which `number_of_deposits(block) > deposit_id`,
/// i.e. the block by which `deposit_id` (0-indexed) had definitely been
/// emitted. Capped at `max_probes` RPC round-trips; if the cap is reached
/// before converging, the window is left as wide as the last probe left
/// it rather than guessed shut.
pub fn bounded_probe_window(
    deployment_block: u64,
    latest_block_searched: u64,
    deposit_id: u64,
    oracle: &dyn DepositCountOracle,
    max_probes: u32,
) -> (u64, u64) {
    let mut lo = deployment_block;
    let mut hi = latest_block_searched;
    let mut probes = 0u32;

    while probes < max_probes && lo < hi {
        let mid = lo + (hi - lo) / 2;
        probes += 1;
        if oracle.number_of_deposits(mid) > deposit_id {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }

    (lo, hi)
}
