//! Per-chain event storage: an ordered, deduplicating log per event kind,
//! plus the block-timestamp table and chain-time monotonicity watchdog that
//! sit alongside it.

pub mod log;
pub mod timestamps;

pub use log::{AppendOutcome, DedupPolicy, EventLog, StoredEvent};
pub use timestamps::{BlockTimestamps, ChainClock};
