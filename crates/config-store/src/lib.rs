//! The ConfigStore state machine: version gates, disabled chains, rate
//! models, route rate model overrides, and per-spoke target balances,
//! indexed by hub block the way every other "as of block X" lookup in this
//! engine is.

pub mod client;
pub mod error;
pub mod history;
pub mod payload;

pub use client::ConfigStoreClient;
pub use error::ConfigStoreError;
pub use history::VersionedHistory;
pub use payload::{parse_disabled_chains, parse_token_config, RateModel, TokenConfig};
