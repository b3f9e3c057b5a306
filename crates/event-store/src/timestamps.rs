//! Block timestamps and the monotonic "current time" watchdog.
//!
//! `ChainClock` applies a "reject a regression, don't silently clamp"
//! discipline to each chain's observed head timestamp: a chain reporting a
//! `currentTime` older than one it has already reported is a hard error,
//! not something to paper over.

use std::collections::HashMap;

use bridge_types::{ChainId, EngineError};

/// A per-chain `block -> timestamp` table. Entries are only ever added for
/// blocks that have actually been searched; lookups for unknown blocks are
/// `None` rather than inferred by interpolation.
#[derive(Debug, Clone, Default)]
pub struct BlockTimestamps {
    by_block: HashMap<u64, u64>,
}

impl BlockTimestamps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, block: u64, timestamp: u64) {
        self.by_block.insert(block, timestamp);
    }

    pub fn get(&self, block: u64) -> Option<u64> {
        self.by_block.get(&block).copied()
    }

    pub fn len(&self) -> usize {
        self.by_block.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_block.is_empty()
    }
}

/// Tracks the latest "current time" observed for a single chain and rejects
/// any reading lower than what has already been seen.
///
/// A bridge relies on the origin chain's notion of "now" to decide deposit
/// expiry; if an RPC provider serves a stale or reorg'd block whose
/// timestamp runs backwards, every downstream expiry decision becomes
/// unsound. `ChainTimeRegression` exists so this gets caught at the source
/// instead of silently producing a wrong reconstruction.
#[derive(Debug, Clone)]
pub struct ChainClock {
    chain: ChainId,
    latest: Option<u64>,
}

impl ChainClock {
    pub fn new(chain: ChainId) -> Self {
        Self { chain, latest: None }
    }

    pub fn current(&self) -> Option<u64> {
        self.latest
    }

    /// Observe a new "current time" reading. Accepts any value greater than
    /// or equal to what was previously observed; anything strictly lower is
    /// a hard error.
    pub fn observe(&mut self, timestamp: u64) -> Result<(), EngineError> {
        if let Some(previous) = self.latest {
            if timestamp < previous {
                return Err(EngineError::ChainTimeRegression {
                    chain: self.chain,
                    observed: timestamp,
                    previous,
                });
            }
        }
        self.latest = Some(timestamp);
        Ok(())
    }
}
