//! The six end-to-end `loadData` scenarios, built fixture-by-hand
//! against the crate's public surface rather than the internals the
//! colocated unit tests in `reconstructor.rs` exercise.

use std::collections::HashMap;

use alloy_primitives::U256;
use async_trait::async_trait;
use bridge_types::{
    Address, ChainId, Deposit, EngineError, EventCoordinates, Fill, FillStatus, FillType, RelayData, RelayDataHash,
    RelayDataWithoutHash, RelayExecutionInfo, SlowFillRequest,
};
use bundle_range::resolver::ChainBundleRange;
use bundle_reconstructor::{load_data, EngineConfig, LoadDataParams, ReconstructionOracle};
use config_store::ConfigStoreClient;
use hub_pool::HubPoolClient;
use repayment_verifier::ChainFamilyOracle;
use spoke_client::{DepositCountOracle, SpokeEventClient};

const ORIGIN: ChainId = ChainId(1);
const DEST: ChainId = ChainId(10);

struct AllEvmChains;
impl ChainFamilyOracle for AllEvmChains {
    fn is_evm(&self, _chain: ChainId) -> bool {
        true
    }
    fn transaction_sender(&self, _fill: &Fill) -> Option<Address> {
        None
    }
}

struct TxSenderIsEvm(Address);
impl ChainFamilyOracle for TxSenderIsEvm {
    fn is_evm(&self, _chain: ChainId) -> bool {
        true
    }
    fn transaction_sender(&self, _fill: &Fill) -> Option<Address> {
        Some(self.0)
    }
}

struct NoTxSender;
impl ChainFamilyOracle for NoTxSender {
    fn is_evm(&self, _chain: ChainId) -> bool {
        true
    }
    fn transaction_sender(&self, _fill: &Fill) -> Option<Address> {
        None
    }
}

struct PanicDepositCountOracle;
impl DepositCountOracle for PanicDepositCountOracle {
    fn number_of_deposits(&self, _block: u64) -> u64 {
        panic!("every fixture deposit is already in memory")
    }
}

struct StubOracle {
    panic_count: PanicDepositCountOracle,
    fill_status: FillStatus,
}

impl StubOracle {
    fn unfilled() -> Self {
        Self { panic_count: PanicDepositCountOracle, fill_status: FillStatus::Unfilled }
    }
}

#[async_trait]
impl ReconstructionOracle for StubOracle {
    async fn fill_status(&self, _destination: ChainId, _relay_data: &RelayData, _at_block: u64) -> Result<FillStatus, EngineError> {
        Ok(self.fill_status)
    }

    async fn find_fill_event(&self, _destination: ChainId, _hash: RelayDataHash, _at_block: u64) -> Result<Option<Fill>, EngineError> {
        Ok(None)
    }

    async fn utilization_window(&self, _l1_token: Address, _quote_block: u64, _input_amount: U256) -> Result<(U256, U256), EngineError> {
        Ok((U256::ZERO, U256::ZERO))
    }

    fn deposit_count_oracle(&self, _chain: ChainId) -> &dyn DepositCountOracle {
        &self.panic_count
    }
}

fn token(byte: u8) -> Address {
    Address::from_evm20([byte; 20])
}

fn addr(byte: u8) -> Address {
    Address::from_evm20([byte; 20])
}

fn base_relay_data(deposit_id: u64, deadline: u32) -> RelayDataWithoutHash {
    RelayDataWithoutHash {
        depositor: addr(1),
        recipient: addr(2),
        exclusive_relayer: Address::ZERO,
        input_token: token(3),
        output_token: token(4),
        input_amount: U256::from(100u64),
        output_amount: U256::from(99u64),
        origin_chain_id: ORIGIN,
        deposit_id: U256::from(deposit_id),
        fill_deadline: deadline,
        exclusivity_deadline: 0,
        destination_chain_id: DEST,
    }
}

fn deposit_at(deposit_id: u64, block: u64, deadline: u32) -> Deposit {
    Deposit::new(base_relay_data(deposit_id, deadline), vec![], 1_000, block, false, false, EventCoordinates::new(block, 0, 0, "0xdep"))
}

fn fill_for(deposit: &Deposit, relayer: Address, repayment_chain: ChainId, block: u64, fill_type: FillType) -> Fill {
    Fill {
        relay_data: deposit.relay_data.clone(),
        relayer,
        repayment_chain_id: repayment_chain,
        relay_execution_info: RelayExecutionInfo {
            updated_recipient: deposit.relay_data.recipient,
            updated_output_amount: deposit.relay_data.output_amount,
            updated_message: vec![],
            fill_type,
        },
        coordinates: EventCoordinates::new(block, 0, 0, "0xfill"),
    }
}

fn ranges(origin_start: u64, origin_end: u64, dest_start: u64, dest_end: u64) -> HashMap<ChainId, ChainBundleRange> {
    let mut m = HashMap::new();
    m.insert(ORIGIN, ChainBundleRange { start: origin_start, end: origin_end, start_time: 0, end_time: 1_000_000 });
    m.insert(DEST, ChainBundleRange { start: dest_start, end: dest_end, start_time: 0, end_time: 1_000_000 });
    m
}

fn pool_routes(hub_pool: &mut HubPoolClient) {
    hub_pool.set_pool_rebalance_route(ORIGIN, token(3), token(99), 1);
    hub_pool.set_pool_rebalance_route(DEST, token(4), token(99), 1);
}

fn engine_config() -> EngineConfig {
    EngineConfig { pre_fill_min_version: 1, force_refund_prefills: false, ..EngineConfig::default() }
}

/// Scenario 1: single happy-path fill.
#[tokio::test]
async fn single_happy_path_fill() {
    let d = deposit_at(1, 100, 3_600);
    let f = fill_for(&d, addr(7), ORIGIN, 110, FillType::FastFill);

    let mut origin_spoke = SpokeEventClient::new(ORIGIN, 0);
    origin_spoke.ingest_deposit(d.clone());
    let mut dest_spoke = SpokeEventClient::new(DEST, 0);
    dest_spoke.ingest_fill(f).unwrap();

    let mut spokes = HashMap::new();
    spokes.insert(ORIGIN, origin_spoke);
    spokes.insert(DEST, dest_spoke);

    let ranges = ranges(50, 200, 50, 200);
    let mut hub_pool = HubPoolClient::new();
    hub_pool.set_latest_block_searched(1000);
    pool_routes(&mut hub_pool);
    let config_store = ConfigStoreClient::new();
    let chain_family = AllEvmChains;
    let oracle = StubOracle::unfilled();
    let config = engine_config();

    let out = load_data(LoadDataParams {
        ranges: &ranges,
        spokes: &spokes,
        hub_pool: &hub_pool,
        config_store: &config_store,
        hub_start_block: 1,
        hub_latest_block: 1000,
        chain_family: &chain_family,
        oracle: &oracle,
        engine_config: &config,
    })
    .await
    .unwrap();

    assert_eq!(out.bundle_data.bundle_deposits[&ORIGIN][&token(3)], vec![d]);
    let fills_for_token = &out.bundle_data.bundle_fills[&ORIGIN][&token(3)];
    assert_eq!(fills_for_token.fills.len(), 1);
    assert_eq!(fills_for_token.refunds[&addr(7)], U256::from(100u64));
    assert!(out.bundle_data.bundle_slow_fills.is_empty());
    assert!(out.bundle_data.unexecutable_slow_fills.is_empty());
}

/// Scenario 2: deposit expires unfilled.
#[tokio::test]
async fn expired_unfilled_deposit() {
    let d = deposit_at(1, 100, 10);

    let mut origin_spoke = SpokeEventClient::new(ORIGIN, 0);
    origin_spoke.ingest_deposit(d.clone());
    let dest_spoke = SpokeEventClient::new(DEST, 0);

    let mut spokes = HashMap::new();
    spokes.insert(ORIGIN, origin_spoke);
    spokes.insert(DEST, dest_spoke);

    let mut ranges = ranges(50, 200, 50, 200);
    ranges.get_mut(&DEST).unwrap().end_time = 1_000;
    let mut hub_pool = HubPoolClient::new();
    hub_pool.set_latest_block_searched(1000);
    pool_routes(&mut hub_pool);
    let config_store = ConfigStoreClient::new();
    let chain_family = AllEvmChains;
    let oracle = StubOracle::unfilled();
    let config = engine_config();

    let out = load_data(LoadDataParams {
        ranges: &ranges,
        spokes: &spokes,
        hub_pool: &hub_pool,
        config_store: &config_store,
        hub_start_block: 1,
        hub_latest_block: 1000,
        chain_family: &chain_family,
        oracle: &oracle,
        engine_config: &config,
    })
    .await
    .unwrap();

    assert_eq!(out.bundle_data.expired_deposits[&ORIGIN][&token(3)], vec![d]);
    assert!(out.bundle_data.bundle_fills.is_empty());
}

/// Scenario 3: slow-fill request followed by a same-bundle ReplacedSlowFill.
#[tokio::test]
async fn replaced_slow_fill_same_bundle() {
    let d = deposit_at(1, 100, 3_600);
    let req = SlowFillRequest { relay_data: d.relay_data.clone(), destination_chain_id: DEST, coordinates: EventCoordinates::new(120, 0, 0, "0xreq") };
    let f = fill_for(&d, addr(7), ORIGIN, 130, FillType::ReplacedSlowFill);

    let mut origin_spoke = SpokeEventClient::new(ORIGIN, 0);
    origin_spoke.ingest_deposit(d.clone());
    let mut dest_spoke = SpokeEventClient::new(DEST, 0);
    dest_spoke.ingest_slow_fill_request(req).unwrap();
    dest_spoke.ingest_fill(f).unwrap();

    let mut spokes = HashMap::new();
    spokes.insert(ORIGIN, origin_spoke);
    spokes.insert(DEST, dest_spoke);

    let ranges = ranges(50, 200, 50, 200);
    let mut hub_pool = HubPoolClient::new();
    hub_pool.set_latest_block_searched(1000);
    pool_routes(&mut hub_pool);
    let config_store = ConfigStoreClient::new();
    let chain_family = AllEvmChains;
    let oracle = StubOracle::unfilled();
    let config = engine_config();

    let out = load_data(LoadDataParams {
        ranges: &ranges,
        spokes: &spokes,
        hub_pool: &hub_pool,
        config_store: &config_store,
        hub_start_block: 1,
        hub_latest_block: 1000,
        chain_family: &chain_family,
        oracle: &oracle,
        engine_config: &config,
    })
    .await
    .unwrap();

    assert!(out.bundle_data.bundle_slow_fills.is_empty());
    assert!(out.bundle_data.unexecutable_slow_fills.is_empty());
    assert_eq!(out.bundle_data.bundle_fills[&ORIGIN][&token(3)].fills.len(), 1);
}

/// Scenario 4: a prior-bundle slow-fill request replaced by a fill in this bundle.
#[tokio::test]
async fn prior_bundle_slow_fill_request_becomes_unexecutable() {
    let d = deposit_at(1, 30, 3_600);
    let req = SlowFillRequest { relay_data: d.relay_data.clone(), destination_chain_id: DEST, coordinates: EventCoordinates::new(40, 0, 0, "0xreq") };
    let f = fill_for(&d, addr(7), ORIGIN, 120, FillType::ReplacedSlowFill);

    let mut origin_spoke = SpokeEventClient::new(ORIGIN, 0);
    origin_spoke.ingest_deposit(d.clone());
    let mut dest_spoke = SpokeEventClient::new(DEST, 0);
    dest_spoke.ingest_slow_fill_request(req).unwrap();
    dest_spoke.ingest_fill(f).unwrap();

    let mut spokes = HashMap::new();
    spokes.insert(ORIGIN, origin_spoke);
    spokes.insert(DEST, dest_spoke);

    // origin deposit at block 30 predates the bundle's origin start (50); the
    // slow-fill request at block 40 predates the bundle's destination start too.
    let ranges = ranges(50, 200, 50, 200);
    let mut hub_pool = HubPoolClient::new();
    hub_pool.set_latest_block_searched(1000);
    pool_routes(&mut hub_pool);
    let config_store = ConfigStoreClient::new();
    let chain_family = AllEvmChains;
    let oracle = StubOracle::unfilled();
    let config = engine_config();

    let out = load_data(LoadDataParams {
        ranges: &ranges,
        spokes: &spokes,
        hub_pool: &hub_pool,
        config_store: &config_store,
        hub_start_block: 1,
        hub_latest_block: 1000,
        chain_family: &chain_family,
        oracle: &oracle,
        engine_config: &config,
    })
    .await
    .unwrap();

    assert_eq!(out.bundle_data.unexecutable_slow_fills[&DEST][&token(4)], vec![d]);
}

/// Scenario 5: duplicate deposits sharing one RelayDataHash, one fast fill.
#[tokio::test]
async fn duplicate_deposits_one_fast_fill() {
    let d1 = deposit_at(1, 100, 3_600);
    let mut d2 = d1.clone();
    d2.coordinates = EventCoordinates::new(101, 0, 0, "0xdep2");
    let f = fill_for(&d1, addr(7), ORIGIN, 110, FillType::FastFill);

    let mut origin_spoke = SpokeEventClient::new(ORIGIN, 0);
    origin_spoke.ingest_deposit(d1);
    origin_spoke.ingest_deposit(d2);
    let mut dest_spoke = SpokeEventClient::new(DEST, 0);
    dest_spoke.ingest_fill(f).unwrap();

    let mut spokes = HashMap::new();
    spokes.insert(ORIGIN, origin_spoke);
    spokes.insert(DEST, dest_spoke);

    let ranges = ranges(50, 200, 50, 200);
    let mut hub_pool = HubPoolClient::new();
    hub_pool.set_latest_block_searched(1000);
    pool_routes(&mut hub_pool);
    let config_store = ConfigStoreClient::new();
    let chain_family = AllEvmChains;
    let oracle = StubOracle::unfilled();
    let config = engine_config();

    let out = load_data(LoadDataParams {
        ranges: &ranges,
        spokes: &spokes,
        hub_pool: &hub_pool,
        config_store: &config_store,
        hub_start_block: 1,
        hub_latest_block: 1000,
        chain_family: &chain_family,
        oracle: &oracle,
        engine_config: &config,
    })
    .await
    .unwrap();

    let fills_for_token = &out.bundle_data.bundle_fills[&ORIGIN][&token(3)];
    assert_eq!(fills_for_token.fills.len(), 2);
    assert_eq!(fills_for_token.refunds[&addr(7)], U256::from(200u64));
}

/// Scenario 6: an invalid relayer address is rewritten to the transaction
/// sender when the sender is usable, and recorded unrepayable when it isn't.
#[tokio::test]
async fn invalid_relayer_rewritten_to_tx_sender_when_usable() {
    let d = deposit_at(1, 100, 3_600);
    let mut bad_bytes = [0u8; 32];
    bad_bytes[0] = 9;
    let bad_relayer = Address::from_bytes32(bad_bytes);
    let f = fill_for(&d, bad_relayer, ORIGIN, 110, FillType::FastFill);

    let mut origin_spoke = SpokeEventClient::new(ORIGIN, 0);
    origin_spoke.ingest_deposit(d.clone());
    let mut dest_spoke = SpokeEventClient::new(DEST, 0);
    dest_spoke.ingest_fill(f).unwrap();

    let mut spokes = HashMap::new();
    spokes.insert(ORIGIN, origin_spoke);
    spokes.insert(DEST, dest_spoke);

    let ranges = ranges(50, 200, 50, 200);
    let mut hub_pool = HubPoolClient::new();
    hub_pool.set_latest_block_searched(1000);
    pool_routes(&mut hub_pool);
    let config_store = ConfigStoreClient::new();
    let sender = addr(77);
    let chain_family = TxSenderIsEvm(sender);
    let oracle = StubOracle::unfilled();
    let config = engine_config();

    let out = load_data(LoadDataParams {
        ranges: &ranges,
        spokes: &spokes,
        hub_pool: &hub_pool,
        config_store: &config_store,
        hub_start_block: 1,
        hub_latest_block: 1000,
        chain_family: &chain_family,
        oracle: &oracle,
        engine_config: &config,
    })
    .await
    .unwrap();

    let fills_for_token = &out.bundle_data.bundle_fills[&ORIGIN][&token(3)];
    assert_eq!(fills_for_token.fills[0].relayer, sender);
    assert!(out.unrepayable_fills.is_empty());
}

/// Scenario 6, continued: no usable sender either ⇒ unrepayable, not refunded.
#[tokio::test]
async fn invalid_relayer_with_no_usable_sender_is_unrepayable() {
    let d = deposit_at(1, 100, 3_600);
    let mut bad_bytes = [0u8; 32];
    bad_bytes[0] = 9;
    let bad_relayer = Address::from_bytes32(bad_bytes);
    let f = fill_for(&d, bad_relayer, ORIGIN, 110, FillType::FastFill);

    let mut origin_spoke = SpokeEventClient::new(ORIGIN, 0);
    origin_spoke.ingest_deposit(d.clone());
    let mut dest_spoke = SpokeEventClient::new(DEST, 0);
    dest_spoke.ingest_fill(f).unwrap();

    let mut spokes = HashMap::new();
    spokes.insert(ORIGIN, origin_spoke);
    spokes.insert(DEST, dest_spoke);

    let ranges = ranges(50, 200, 50, 200);
    let mut hub_pool = HubPoolClient::new();
    hub_pool.set_latest_block_searched(1000);
    pool_routes(&mut hub_pool);
    let config_store = ConfigStoreClient::new();
    let chain_family = NoTxSender;
    let oracle = StubOracle::unfilled();
    let config = engine_config();

    let out = load_data(LoadDataParams {
        ranges: &ranges,
        spokes: &spokes,
        hub_pool: &hub_pool,
        config_store: &config_store,
        hub_start_block: 1,
        hub_latest_block: 1000,
        chain_family: &chain_family,
        oracle: &oracle,
        engine_config: &config,
    })
    .await
    .unwrap();

    assert!(out.bundle_data.bundle_fills.is_empty());
    assert_eq!(out.unrepayable_fills.len(), 1);
}

/// A `ReplacedSlowFill` with an unrepayable relayer must still mark the prior
/// slow-fill-request leaf unexecutable — the repayment failure is orthogonal
/// to the duplicate/slow-fill bookkeeping it would otherwise skip.
#[tokio::test]
async fn replaced_slow_fill_with_unrepayable_relayer_still_becomes_unexecutable() {
    let d = deposit_at(1, 30, 3_600);
    let req = SlowFillRequest { relay_data: d.relay_data.clone(), destination_chain_id: DEST, coordinates: EventCoordinates::new(40, 0, 0, "0xreq") };
    let mut bad_bytes = [0u8; 32];
    bad_bytes[0] = 9;
    let bad_relayer = Address::from_bytes32(bad_bytes);
    let f = fill_for(&d, bad_relayer, ORIGIN, 120, FillType::ReplacedSlowFill);

    let mut origin_spoke = SpokeEventClient::new(ORIGIN, 0);
    origin_spoke.ingest_deposit(d.clone());
    let mut dest_spoke = SpokeEventClient::new(DEST, 0);
    dest_spoke.ingest_slow_fill_request(req).unwrap();
    dest_spoke.ingest_fill(f).unwrap();

    let mut spokes = HashMap::new();
    spokes.insert(ORIGIN, origin_spoke);
    spokes.insert(DEST, dest_spoke);

    let ranges = ranges(50, 200, 50, 200);
    let mut hub_pool = HubPoolClient::new();
    hub_pool.set_latest_block_searched(1000);
    pool_routes(&mut hub_pool);
    let config_store = ConfigStoreClient::new();
    let chain_family = NoTxSender;
    let oracle = StubOracle::unfilled();
    let config = engine_config();

    let out = load_data(LoadDataParams {
        ranges: &ranges,
        spokes: &spokes,
        hub_pool: &hub_pool,
        config_store: &config_store,
        hub_start_block: 1,
        hub_latest_block: 1000,
        chain_family: &chain_family,
        oracle: &oracle,
        engine_config: &config,
    })
    .await
    .unwrap();

    assert!(out.bundle_data.bundle_fills.is_empty());
    assert_eq!(out.unrepayable_fills.len(), 1);
    assert_eq!(out.bundle_data.unexecutable_slow_fills[&DEST][&token(4)], vec![d]);
}

/// Duplicate deposits sharing a hash on a genuine slow fill must be refunded
/// exactly once: the re-sweep must not repeat what the fill-matching phase
/// already recorded for the same duplicate.
#[tokio::test]
async fn duplicate_deposits_on_slow_fill_refund_each_depositor_once() {
    let d1 = deposit_at(1, 100, 3_600);
    let mut d2 = d1.clone();
    d2.coordinates = EventCoordinates::new(101, 0, 0, "0xdep2");
    let f = fill_for(&d1, addr(7), ORIGIN, 130, FillType::SlowFill);

    let mut origin_spoke = SpokeEventClient::new(ORIGIN, 0);
    origin_spoke.ingest_deposit(d1);
    origin_spoke.ingest_deposit(d2);
    let mut dest_spoke = SpokeEventClient::new(DEST, 0);
    dest_spoke.ingest_fill(f).unwrap();

    let mut spokes = HashMap::new();
    spokes.insert(ORIGIN, origin_spoke);
    spokes.insert(DEST, dest_spoke);

    let ranges = ranges(50, 200, 50, 200);
    let mut hub_pool = HubPoolClient::new();
    hub_pool.set_latest_block_searched(1000);
    pool_routes(&mut hub_pool);
    let config_store = ConfigStoreClient::new();
    let chain_family = AllEvmChains;
    let oracle = StubOracle::unfilled();
    let config = engine_config();

    let out = load_data(LoadDataParams {
        ranges: &ranges,
        spokes: &spokes,
        hub_pool: &hub_pool,
        config_store: &config_store,
        hub_start_block: 1,
        hub_latest_block: 1000,
        chain_family: &chain_family,
        oracle: &oracle,
        engine_config: &config,
    })
    .await
    .unwrap();

    assert_eq!(out.bundle_data.expired_deposits[&ORIGIN][&token(3)].len(), 1);
}
