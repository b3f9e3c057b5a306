//! Deposit events, emitted on an origin spoke.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::chain::ChainId;
use crate::event::EventCoordinates;
use crate::hash::{message_hash, RelayData, RelayDataHash};

/// A deposit id above `u32::MAX` is "unsafe" and excluded from min/max id
/// tracking — some integrations mint huge ids for intentionally-invalid
/// deposits and must not perturb bookkeeping that assumes a dense id space.
pub const UNSAFE_DEPOSIT_ID_THRESHOLD: u64 = u32::MAX as u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deposit {
    pub relay_data: RelayData,
    pub quote_timestamp: u64,
    /// The hub block resolved for `quote_timestamp` by the HubPool Client.
    /// Never decreases as new events arrive.
    pub quote_block_number: u64,
    pub from_lite_chain: bool,
    pub to_lite_chain: bool,
    /// Plaintext message; `relay_data.message_hash` is derived from this.
    pub message: Vec<u8>,
    pub coordinates: EventCoordinates,
}

impl Deposit {
    pub fn new(
        relay_data_without_hash: RelayDataWithoutHash,
        message: Vec<u8>,
        quote_timestamp: u64,
        quote_block_number: u64,
        from_lite_chain: bool,
        to_lite_chain: bool,
        coordinates: EventCoordinates,
    ) -> Self {
        let relay_data = relay_data_without_hash.into_relay_data(message_hash(&message));
        Deposit {
            relay_data,
            quote_timestamp,
            quote_block_number,
            from_lite_chain,
            to_lite_chain,
            message,
            coordinates,
        }
    }

    pub fn hash(&self) -> RelayDataHash {
        self.relay_data.hash()
    }

    pub fn origin_chain_id(&self) -> ChainId {
        self.relay_data.origin_chain_id
    }

    pub fn destination_chain_id(&self) -> ChainId {
        self.relay_data.destination_chain_id
    }

    pub fn deposit_id(&self) -> U256 {
        self.relay_data.deposit_id
    }

    pub fn input_token(&self) -> Address {
        self.relay_data.input_token
    }

    /// `isZeroValue(deposit)`: an `inputAmount = 0` deposit with no message
    /// is excluded from all downstream processing.
    pub fn is_zero_value(&self) -> bool {
        self.relay_data.input_amount.is_zero() && self.message.is_empty()
    }

    /// Whether this deposit's id is too large to participate in min/max id
    /// tracking (see [`UNSAFE_DEPOSIT_ID_THRESHOLD`]).
    pub fn has_unsafe_deposit_id(&self) -> bool {
        self.relay_data.deposit_id > U256::from(UNSAFE_DEPOSIT_ID_THRESHOLD)
    }

    /// A deposit is newly expired in a bundle whose destination window is
    /// `[start_time, end_time)` iff its fill deadline falls at or before the
    /// window's end and at or after the window's start.
    pub fn is_newly_expired_in(&self, start_time: u64, end_time: u64) -> bool {
        let deadline = self.relay_data.fill_deadline as u64;
        deadline < end_time && deadline >= start_time
    }

    /// Whether the deposit's fill deadline has passed as of `end_time`,
    /// independent of which bundle it first appeared in.
    pub fn is_expired_by(&self, end_time: u64) -> bool {
        (self.relay_data.fill_deadline as u64) < end_time
    }
}

/// Builder payload for [`Deposit::new`] — every relay-data field except the
/// derived `message_hash`, which only the plaintext message can produce.
pub struct RelayDataWithoutHash {
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
    pub destination_chain_id: ChainId,
}

impl RelayDataWithoutHash {
    fn into_relay_data(self, message_hash: [u8; 32]) -> RelayData {
        RelayData {
            depositor: self.depositor,
            recipient: self.recipient,
            exclusive_relayer: self.exclusive_relayer,
            input_token: self.input_token,
            output_token: self.output_token,
            input_amount: self.input_amount,
            output_amount: self.output_amount,
            origin_chain_id: self.origin_chain_id,
            deposit_id: self.deposit_id,
            fill_deadline: self.fill_deadline,
            exclusivity_deadline: self.exclusivity_deadline,
            message_hash,
            destination_chain_id: self.destination_chain_id,
        }
    }
}

/// Serializable view of a deposit, used for the blob cache document
/// where every numeric field is a decimal string for arbitrary precision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositView {
    pub depositor: String,
    pub recipient: String,
    pub input_token: String,
    pub input_amount: String,
    pub output_token: String,
    pub output_amount: String,
    pub origin_chain_id: u64,
    pub destination_chain_id: u64,
    pub deposit_id: String,
    pub quote_timestamp: u64,
    pub fill_deadline: u32,
}

impl From<&Deposit> for DepositView {
    fn from(d: &Deposit) -> Self {
        DepositView {
            depositor: d.relay_data.depositor.to_hex(),
            recipient: d.relay_data.recipient.to_hex(),
            input_token: d.relay_data.input_token.to_hex(),
            input_amount: d.relay_data.input_amount.to_string(),
            output_token: d.relay_data.output_token.to_hex(),
            output_amount: d.relay_data.output_amount.to_string(),
            origin_chain_id: d.relay_data.origin_chain_id.as_u64(),
            destination_chain_id: d.relay_data.destination_chain_id.as_u64(),
            deposit_id: d.relay_data.deposit_id.to_string(),
            quote_timestamp: d.quote_timestamp,
            fill_deadline: d.relay_data.fill_deadline,
        }
    }
}
