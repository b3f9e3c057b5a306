//! Fill and slow-fill-request events, emitted on a destination spoke.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::chain::ChainId;
use crate::event::EventCoordinates;
use crate::hash::{RelayData, RelayDataHash};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillType {
    FastFill,
    ReplacedSlowFill,
    SlowFill,
}

impl FillType {
    pub fn is_slow(&self) -> bool {
        matches!(self, FillType::SlowFill)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayExecutionInfo {
    pub updated_recipient: Address,
    pub updated_output_amount: U256,
    pub updated_message: Vec<u8>,
    pub fill_type: FillType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    pub relay_data: RelayData,
    pub relayer: Address,
    pub repayment_chain_id: ChainId,
    pub relay_execution_info: RelayExecutionInfo,
    pub coordinates: EventCoordinates,
}

impl Fill {
    pub fn hash(&self) -> RelayDataHash {
        self.relay_data.hash()
    }

    pub fn is_slow(&self) -> bool {
        self.relay_execution_info.fill_type.is_slow()
    }

    pub fn is_zero_value(&self) -> bool {
        self.relay_data.input_amount.is_zero() && self.relay_data.message_hash == [0u8; 32]
    }

    pub fn deposit_id(&self) -> U256 {
        self.relay_data.deposit_id
    }

    pub fn origin_chain_id(&self) -> ChainId {
        self.relay_data.origin_chain_id
    }

    pub fn destination_chain_id(&self) -> ChainId {
        self.relay_data.destination_chain_id
    }

    /// Returns a copy with `relayer`/`repayment_chain_id` overwritten —
    /// the Repayment Verifier's final rewritten-relayer output shape.
    pub fn with_repayment(&self, relayer: Address, repayment_chain_id: ChainId) -> Fill {
        let mut copy = self.clone();
        copy.relayer = relayer;
        copy.repayment_chain_id = repayment_chain_id;
        copy
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlowFillRequest {
    pub relay_data: RelayData,
    pub destination_chain_id: ChainId,
    pub coordinates: EventCoordinates,
}

impl SlowFillRequest {
    pub fn hash(&self) -> RelayDataHash {
        self.relay_data.hash()
    }

    pub fn origin_chain_id(&self) -> ChainId {
        self.relay_data.origin_chain_id
    }
}

/// The on-chain status a destination spoke's fill-status oracle reports
/// for a given relay data tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillStatus {
    Unfilled,
    RequestedSlowFill,
    Filled,
}

/// Serializable view of a fill, used for the blob cache document
/// where every numeric field is a decimal string for arbitrary precision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillView {
    pub relayer: String,
    pub repayment_chain_id: u64,
    pub origin_chain_id: u64,
    pub destination_chain_id: u64,
    pub deposit_id: String,
    pub input_amount: String,
    pub output_amount: String,
    pub fill_type: FillType,
}

impl From<&Fill> for FillView {
    fn from(f: &Fill) -> Self {
        FillView {
            relayer: f.relayer.to_hex(),
            repayment_chain_id: f.repayment_chain_id.as_u64(),
            origin_chain_id: f.origin_chain_id().as_u64(),
            destination_chain_id: f.destination_chain_id().as_u64(),
            deposit_id: f.deposit_id().to_string(),
            input_amount: f.relay_data.input_amount.to_string(),
            output_amount: f.relay_data.output_amount.to_string(),
            fill_type: f.relay_execution_info.fill_type,
        }
    }
}
