//! Error kinds shared across the engine, plus low-level type-parsing errors.
//!
//! `EngineError` enumerates every recoverable and unrecoverable failure mode
//! the reconstruction pipeline can hit, so every crate in the workspace
//! returns the same typed error; only example/test binaries convert it to
//! `eyre::Report` at the boundary.

use thiserror::Error;

use crate::chain::ChainId;
use crate::hash::RelayDataHash;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string")]
    InvalidHex,
    #[error("address must be 20 or 32 bytes, got {0}")]
    WrongAddressLength(usize),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("client for chain {0} has not been updated since the last reconstruction")]
    StaleClient(ChainId),

    #[error("spoke client for chain {0} has not been updated")]
    StaleSpoke(ChainId),

    #[error("block range invalid: {reason}")]
    InvalidBlockRange { reason: String },

    #[error("chain {chain} reported a timestamp regression: saw {observed}, previously {previous}")]
    ChainTimeRegression {
        chain: ChainId,
        observed: u64,
        previous: u64,
    },

    #[error("duplicate {kind} event for relay data hash {hash}")]
    DuplicateEvent { kind: &'static str, hash: RelayDataHash },

    #[error("prefill lookup failed for relay data hash {0}: on-chain status is Filled but no matching fill event was found")]
    PrefillLookupFailed(RelayDataHash),

    #[error("no route for token {token} on chain {chain}")]
    MissingRoute { chain: ChainId, token: String },

    #[error("fill-status oracle unavailable for chain {0}")]
    OracleUnavailable(ChainId),

    #[error("blob cache miss for key {0}")]
    BlobCacheMiss(String),

    #[error("malformed blob for key {0}: {reason}")]
    MalformedBlob { key: String, reason: String },
}

impl EngineError {
    /// Whether this error kind is locally recoverable by falling back to a
    /// from-scratch recompute.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::BlobCacheMiss(_) | EngineError::MalformedBlob { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_cache_miss_is_recoverable() {
        assert!(EngineError::BlobCacheMiss("123".into()).is_recoverable());
    }

    #[test]
    fn stale_client_is_not_recoverable() {
        assert!(!EngineError::StaleClient(ChainId(1)).is_recoverable());
    }
}
