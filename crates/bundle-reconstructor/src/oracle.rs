//! Out-of-scope I/O boundaries the reconstructor consults mid-algorithm,
//! following the same division of labor `spoke_client::DepositCountOracle`
//! and `repayment_verifier::ChainFamilyOracle` already establish: this crate
//! never talks to a chain directly, the embedding binary backs these
//! traits with its own RPC client.

use alloy_primitives::U256;
use async_trait::async_trait;
use bridge_types::{Address, ChainId, EngineError, Fill, FillStatus, RelayData, RelayDataHash};
use spoke_client::DepositCountOracle;

/// The facts Phases 2, 4, 6, and 7 need that no Spoke/Hub/ConfigStore
/// client snapshot can answer on its own.
#[async_trait]
pub trait ReconstructionOracle: Send + Sync {
    /// `relayFillStatus(relayData, blockTag)` on `destination`'s fill-status
    /// oracle.
    async fn fill_status(
        &self,
        destination: ChainId,
        relay_data: &RelayData,
        at_block: u64,
    ) -> Result<FillStatus, EngineError>;

    /// An exact log query for the fill matching `hash` on `destination`,
    /// used only once the fill-status oracle has already reported `Filled` —
    /// a miss here is the hard `PrefillLookupFailed` error, not a
    /// recoverable one.
    async fn find_fill_event(
        &self,
        destination: ChainId,
        hash: RelayDataHash,
        at_block: u64,
    ) -> Result<Option<Fill>, EngineError>;

    /// The pool-utilization band `input_amount` pushes `l1_token` through
    /// at `quote_block`, feeding `hub_pool::lpfee::LpFeeInput`. Utilization
    /// accounting itself lives outside this crate (see `hub_pool::lpfee`
    /// doc comment) — this is the seam a real pool-state reader plugs into.
    async fn utilization_window(
        &self,
        l1_token: Address,
        quote_block: u64,
        input_amount: U256,
    ) -> Result<(U256, U256), EngineError>;

    /// The `numberOfDeposits(blockTag)` oracle for `chain`, handed to
    /// `spoke_client::SpokeEventClient::find_deposit`'s bounded probe
    /// search.
    fn deposit_count_oracle(&self, chain: ChainId) -> &dyn DepositCountOracle;
}
