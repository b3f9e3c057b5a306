//! Canonical cross-chain address representation.
//!
//! Every address in the engine — depositor, recipient, relayer, token — is
//! stored as a 32-byte canonical identifier so that EVM and non-EVM chains
//! share one wire format. On EVM chains only the low 20 bytes are
//! significant; an address is "EVM-valid" iff its high 12 bytes are zero.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The chain family an [`Address`] was minted on.
///
/// This is informational only — `is_evm_valid` is a pure byte-pattern check
/// and does not consult this field. A non-EVM address that happens to have
/// 12 leading zero bytes is still "EVM-valid" by that byte-pattern definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainFamily {
    Evm,
    NonEvm,
}

/// A 32-byte canonical address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const ZERO: Address = Address([0u8; 32]);

    /// Build a canonical address from a 20-byte EVM address, left-padded
    /// with zeros the way Solidity's `bytes32(uint256(uint160(addr)))` does.
    pub fn from_evm20(bytes: [u8; 20]) -> Self {
        let mut out = [0u8; 32];
        out[12..].copy_from_slice(&bytes);
        Address(out)
    }

    /// Build a canonical address directly from 32 raw bytes.
    pub fn from_bytes32(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// An address is EVM-valid iff the high 12 bytes are zero — i.e. it fits
    /// in the low 20 bytes the way an EVM `address` does.
    pub fn is_evm_valid(&self) -> bool {
        self.0[..12].iter().all(|&b| b == 0)
    }

    /// Low 20 bytes, meaningful only when [`is_evm_valid`](Self::is_evm_valid) is true.
    pub fn low20(&self) -> [u8; 20] {
        let mut out = [0u8; 20];
        out.copy_from_slice(&self.0[12..]);
        out
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn from_hex(s: &str) -> Result<Self, crate::error::TypeError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| crate::error::TypeError::InvalidHex)?;
        match bytes.len() {
            20 => {
                let mut arr = [0u8; 20];
                arr.copy_from_slice(&bytes);
                Ok(Address::from_evm20(arr))
            }
            32 => {
                let mut arr = [0u8; 32];
                arr.copy_from_slice(&bytes);
                Ok(Address(arr))
            }
            n => Err(crate::error::TypeError::WrongAddressLength(n)),
        }
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evm_valid_for_low20_only() {
        let a = Address::from_evm20([1u8; 20]);
        assert!(a.is_evm_valid());
    }

    #[test]
    fn not_evm_valid_with_high_bytes_set() {
        let mut raw = [0u8; 32];
        raw[0] = 1;
        let a = Address::from_bytes32(raw);
        assert!(!a.is_evm_valid());
    }

    #[test]
    fn hex_roundtrip_32_byte() {
        let a = Address::from_bytes32([7u8; 32]);
        let hex = a.to_hex();
        let back = Address::from_hex(&hex).unwrap();
        assert_eq!(a, back);
    }

    #[test]
    fn hex_roundtrip_20_byte_pads_to_evm_valid() {
        let a = Address::from_hex("0xdeadbeef00000000000000000000000000dead").unwrap();
        assert!(a.is_evm_valid());
        assert_eq!(a.low20(), {
            let mut b = [0u8; 20];
            hex::decode_to_slice("deadbeef00000000000000000000000000dead", &mut b).unwrap();
            b
        });
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Address::from_hex("0xdead").is_err());
    }

    #[test]
    fn zero_is_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::from_evm20([1u8; 20]).is_zero());
    }
}
