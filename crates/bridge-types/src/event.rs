//! Event ordering coordinates shared by every on-chain event kind.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The total order key for events within a chain: ascending
/// `(block, txIndex, logIndex)`. `tx_ref` is carried for diagnostics/logging
/// only and never participates in ordering or equality beyond what the
/// three numeric fields already determine.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct EventCoordinates {
    pub block: u64,
    pub tx_index: u32,
    pub log_index: u32,
    pub tx_ref: String,
}

impl EventCoordinates {
    pub fn new(block: u64, tx_index: u32, log_index: u32, tx_ref: impl Into<String>) -> Self {
        Self {
            block,
            tx_index,
            log_index,
            tx_ref: tx_ref.into(),
        }
    }

    fn order_key(&self) -> (u64, u32, u32) {
        (self.block, self.tx_index, self.log_index)
    }
}

impl PartialEq for EventCoordinates {
    fn eq(&self, other: &Self) -> bool {
        self.order_key() == other.order_key()
    }
}

impl PartialOrd for EventCoordinates {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventCoordinates {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}
