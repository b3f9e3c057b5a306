//! Depositor-issued speed-up signatures.
//!
//! A speed-up never changes a deposit's `RelayData` (and so never changes
//! its `RelayDataHash` or fill-matching identity) — it is an off-chain-
//! signed instruction a relayer may honor when filling, recorded on a fill
//! via `RelayExecutionInfo`. Tracking it here is bookkeeping for whichever
//! relayer is about to fill, not an input to bundle reconstruction.

use alloy_primitives::U256;
use bridge_types::{Address, EventCoordinates};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeedUp {
    pub deposit_id: U256,
    pub updated_output_amount: U256,
    pub updated_recipient: Address,
    pub updated_message: Vec<u8>,
    pub coordinates: EventCoordinates,
}

/// Among candidate speed-ups for one deposit id, the applicable one is the
/// single entry with the lowest `updated_output_amount`, and only if that
/// amount is strictly less than the deposit's current `output_amount`.
pub fn select_applicable<'a>(
    candidates: &'a [SpeedUp],
    current_output_amount: U256,
) -> Option<&'a SpeedUp> {
    let lowest = candidates.iter().min_by_key(|s| s.updated_output_amount)?;
    if lowest.updated_output_amount < current_output_amount {
        Some(lowest)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn su(amount: u64, block: u64) -> SpeedUp {
        SpeedUp {
            deposit_id: U256::from(1u64),
            updated_output_amount: U256::from(amount),
            updated_recipient: Address::ZERO,
            updated_message: vec![],
            coordinates: EventCoordinates::new(block, 0, 0, "0x"),
        }
    }

    #[test]
    fn picks_lowest_when_strictly_below_current() {
        let candidates = vec![su(90, 1), su(80, 2), su(95, 3)];
        let picked = select_applicable(&candidates, U256::from(100u64)).unwrap();
        assert_eq!(picked.updated_output_amount, U256::from(80u64));
    }

    #[test]
    fn none_when_lowest_is_not_strictly_below_current() {
        let candidates = vec![su(100, 1), su(110, 2)];
        assert!(select_applicable(&candidates, U256::from(100u64)).is_none());
    }

    #[test]
    fn none_for_empty_candidates() {
        assert!(select_applicable(&[], U256::from(100u64)).is_none());
    }
}
