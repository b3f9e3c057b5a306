//! Canonical content hash identifying a bridge intent across chains.
//!
//! A fixed-layout byte buffer is built field by field and reduced with
//! keccak256. Two relay data tuples with equal `RelayDataHash` are the
//! "same bridge intent"; the Merkle hash a destination spoke's fill-status
//! oracle expects is a distinct, protocol-specific concept and lives with
//! the spoke client, not here.

use alloy_primitives::keccak256;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;
use crate::chain::ChainId;
use alloy_primitives::U256;

/// A canonical, collision-resistant key identifying one bridge intent:
/// the tuple (depositor, recipient, exclusiveRelayer, inputToken,
/// outputToken, inputAmount, outputAmount, originChainId, depositId,
/// fillDeadline, exclusivityDeadline, message, destinationChainId).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelayDataHash(pub [u8; 32]);

impl fmt::Debug for RelayDataHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelayDataHash(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for RelayDataHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// The minimal set of relay-data fields shared by Deposit, Fill, and
/// SlowFillRequest — everything [`RelayDataHash`] is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayData {
    pub depositor: Address,
    pub recipient: Address,
    pub exclusive_relayer: Address,
    pub input_token: Address,
    pub output_token: Address,
    pub input_amount: U256,
    pub output_amount: U256,
    pub origin_chain_id: ChainId,
    pub deposit_id: U256,
    pub fill_deadline: u32,
    pub exclusivity_deadline: u32,
    pub message_hash: [u8; 32],
    pub destination_chain_id: ChainId,
}

impl RelayData {
    /// Compute this relay data's [`RelayDataHash`].
    pub fn hash(&self) -> RelayDataHash {
        let mut buf = Vec::with_capacity(312);
        buf.extend_from_slice(self.depositor.as_bytes());
        buf.extend_from_slice(self.recipient.as_bytes());
        buf.extend_from_slice(self.exclusive_relayer.as_bytes());
        buf.extend_from_slice(self.input_token.as_bytes());
        buf.extend_from_slice(self.output_token.as_bytes());
        buf.extend_from_slice(&self.input_amount.to_be_bytes::<32>());
        buf.extend_from_slice(&self.output_amount.to_be_bytes::<32>());
        buf.extend_from_slice(&self.origin_chain_id.as_u64().to_be_bytes());
        buf.extend_from_slice(&self.deposit_id.to_be_bytes::<32>());
        buf.extend_from_slice(&self.fill_deadline.to_be_bytes());
        buf.extend_from_slice(&self.exclusivity_deadline.to_be_bytes());
        buf.extend_from_slice(&self.message_hash);
        buf.extend_from_slice(&self.destination_chain_id.as_u64().to_be_bytes());
        RelayDataHash(keccak256(&buf).0)
    }
}

/// keccak256 of an arbitrary message payload — the `messageHash` field
/// deposits carry, derived once at ingestion time and never recomputed.
pub fn message_hash(message: &[u8]) -> [u8; 32] {
    keccak256(message).0
}
