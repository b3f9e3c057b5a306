//! Chain identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A chain identifier, e.g. 1 for Ethereum mainnet, 10 for Optimism.
///
/// Chains are addressed by their native 64-bit chain id rather than a
/// sequential registry index — see the `ChainId representation` decision
/// in DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const HUB: ChainId = ChainId(1);

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(v: u64) -> Self {
        ChainId(v)
    }
}

/// Whether a chain participates as a "full" chain (two-way routes to the
/// hub, slow fills allowed) or a "lite" chain (repayment forced to origin,
/// no slow fills).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainKind {
    Full,
    Lite,
}

impl ChainKind {
    pub fn is_lite(&self) -> bool {
        matches!(self, ChainKind::Lite)
    }
}
