//! Shared data model for the cross-chain bridge accounting engine.
//!
//! Every other crate in the workspace builds on the types defined here:
//! canonical addresses and chain ids, the relay-data content hash, the
//! deposit/fill/slow-fill-request event shapes, the bundle output
//! dictionaries, and the shared `EngineError` kinds.

pub mod address;
pub mod amount;
pub mod bundle;
pub mod chain;
pub mod deposit;
pub mod error;
pub mod event;
pub mod fill;
pub mod hash;

pub use address::{Address, ChainFamily};
pub use amount::{mul_div_1e18, mul_div_complement_1e18, ONE_E18};
pub use bundle::{BundleData, BundleFills, DepositsByChainAndToken, FillsForToken, RootBundle, SlowFillsByChainAndToken};
pub use chain::{ChainId, ChainKind};
pub use deposit::{Deposit, DepositView, RelayDataWithoutHash, UNSAFE_DEPOSIT_ID_THRESHOLD};
pub use error::{EngineError, TypeError};
pub use event::EventCoordinates;
pub use fill::{Fill, FillStatus, FillType, FillView, RelayExecutionInfo, SlowFillRequest};
pub use hash::{message_hash, RelayData, RelayDataHash};
