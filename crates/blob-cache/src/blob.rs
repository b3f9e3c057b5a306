//! The persisted document shape: the five output dictionaries keyed
//! as `<chainId>` strings mapped to `<tokenAddress>` strings, every numeric
//! field a decimal string for arbitrary precision — mirroring
//! `bridge_types::DepositView`/`FillView`, which this document embeds.

use std::collections::HashMap;

use bridge_types::{BundleData, DepositView, FillView};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FillsForTokenView {
    pub fills: Vec<FillView>,
    pub total_refund_amount: String,
    pub realized_lp_fees: String,
    /// relayer address (hex) -> decimal-string refund amount.
    pub refunds: HashMap<String, String>,
}

/// Decimal-string-serialized snapshot of one `loadData` result, the unit
/// stored under a bundle's mainnet end block key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleBlob {
    pub bundle_deposits: HashMap<String, HashMap<String, Vec<DepositView>>>,
    pub expired_deposits: HashMap<String, HashMap<String, Vec<DepositView>>>,
    pub bundle_fills: HashMap<String, HashMap<String, FillsForTokenView>>,
    pub bundle_slow_fills: HashMap<String, HashMap<String, Vec<DepositView>>>,
    pub unexecutable_slow_fills: HashMap<String, HashMap<String, Vec<DepositView>>>,
}

impl From<&BundleData> for BundleBlob {
    fn from(data: &BundleData) -> Self {
        BundleBlob {
            bundle_deposits: deposits_view(&data.bundle_deposits),
            expired_deposits: deposits_view(&data.expired_deposits),
            bundle_fills: fills_view(&data.bundle_fills),
            bundle_slow_fills: deposits_view(&data.bundle_slow_fills),
            unexecutable_slow_fills: deposits_view(&data.unexecutable_slow_fills),
        }
    }
}

fn deposits_view(
    by_chain: &HashMap<bridge_types::ChainId, HashMap<bridge_types::Address, Vec<bridge_types::Deposit>>>,
) -> HashMap<String, HashMap<String, Vec<DepositView>>> {
    by_chain
        .iter()
        .map(|(chain, by_token)| {
            let tokens = by_token
                .iter()
                .map(|(token, deposits)| (token.to_hex(), deposits.iter().map(DepositView::from).collect()))
                .collect();
            (chain.as_u64().to_string(), tokens)
        })
        .collect()
}

fn fills_view(
    bundle_fills: &bridge_types::bundle::BundleFills,
) -> HashMap<String, HashMap<String, FillsForTokenView>> {
    bundle_fills
        .iter()
        .map(|(chain, by_token)| {
            let tokens = by_token
                .iter()
                .map(|(token, entry)| {
                    let view = FillsForTokenView {
                        fills: entry.fills.iter().map(FillView::from).collect(),
                        total_refund_amount: entry.total_refund_amount.to_string(),
                        realized_lp_fees: entry.realized_lp_fees.to_string(),
                        refunds: entry.refunds.iter().map(|(addr, amt)| (addr.to_hex(), amt.to_string())).collect(),
                    };
                    (token.to_hex(), view)
                })
                .collect();
            (chain.as_u64().to_string(), tokens)
        })
        .collect()
}
