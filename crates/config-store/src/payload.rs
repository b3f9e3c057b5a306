//! Parsing for the JSON payloads carried by `UpdatedTokenConfig` events.
//!
//! Numeric fields travel as decimal strings, not JSON numbers, because a
//! bridge amount or rate routinely exceeds `f64`/`u64` precision.

use std::collections::HashMap;
use std::str::FromStr;

use alloy_primitives::U256;
use bridge_types::ChainId;
use serde::Deserialize;

use crate::error::ConfigStoreError;

/// The piecewise-linear utilization rate model: flat at `r0` below
/// `u_kink`, then a steeper slope to `r0 + r1` at 100% utilization, with
/// `r2` available as a second breakpoint slope for the post-kink region.
/// All four fields are 1e18 fixed-point, matching every other percentage
/// quantity in this engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateModel {
    pub u_kink: U256,
    pub r0: U256,
    pub r1: U256,
    pub r2: U256,
}

#[derive(Debug, Deserialize)]
struct RateModelPayload {
    #[serde(rename = "UBar")]
    u_kink: String,
    #[serde(rename = "R0")]
    r0: String,
    #[serde(rename = "R1")]
    r1: String,
    #[serde(rename = "R2")]
    r2: String,
}

fn parse_u256(s: &str) -> Result<U256, ConfigStoreError> {
    U256::from_str(s).map_err(|_| ConfigStoreError::MalformedPayload {
        reason: format!("not a valid decimal integer: {s}"),
    })
}

impl TryFrom<RateModelPayload> for RateModel {
    type Error = ConfigStoreError;

    fn try_from(p: RateModelPayload) -> Result<Self, Self::Error> {
        Ok(RateModel {
            u_kink: parse_u256(&p.u_kink)?,
            r0: parse_u256(&p.r0)?,
            r1: parse_u256(&p.r1)?,
            r2: parse_u256(&p.r2)?,
        })
    }
}

/// The parsed, typed form of an `UpdatedTokenConfig` JSON document. Every
/// field is optional: a single update may touch only the rate model, or
/// only the target balances, and so on.
#[derive(Debug, Clone, Default)]
pub struct TokenConfig {
    pub rate_model: Option<RateModel>,
    pub transfer_threshold: Option<U256>,
    pub spoke_target_balances: Option<HashMap<ChainId, U256>>,
    pub route_rate_models: Option<HashMap<(ChainId, ChainId), RateModel>>,
}

#[derive(Debug, Deserialize)]
struct TokenConfigPayload {
    #[serde(default)]
    rate_model: Option<RateModelPayload>,
    #[serde(default, rename = "transferThreshold")]
    transfer_threshold: Option<String>,
    #[serde(default, rename = "spokeTargetBalances")]
    spoke_target_balances: Option<HashMap<String, SpokeTargetBalanceEntry>>,
    #[serde(default, rename = "routeRateModel")]
    route_rate_model: Option<HashMap<String, RateModelPayload>>,
}

#[derive(Debug, Deserialize)]
struct SpokeTargetBalanceEntry {
    threshold: Option<String>,
}

/// Parse a raw `UpdatedTokenConfig` JSON payload. This is the function that
/// the warning-horizon policy in [`crate::client::ConfigStoreClient`] wraps:
/// callers decide whether a parse failure gets logged or silently dropped,
/// this function only ever reports success or failure.
pub fn parse_token_config(raw_json: &str) -> Result<TokenConfig, ConfigStoreError> {
    let payload: TokenConfigPayload =
        serde_json::from_str(raw_json).map_err(|e| ConfigStoreError::MalformedPayload {
            reason: e.to_string(),
        })?;

    let rate_model = payload.rate_model.map(RateModel::try_from).transpose()?;

    let transfer_threshold = payload
        .transfer_threshold
        .as_deref()
        .map(parse_u256)
        .transpose()?;

    let spoke_target_balances = payload
        .spoke_target_balances
        .map(|m| {
            m.into_iter()
                .map(|(chain_str, entry)| {
                    let chain = chain_str
                        .parse::<u64>()
                        .map_err(|_| ConfigStoreError::MalformedPayload {
                            reason: format!("invalid chain id key: {chain_str}"),
                        })?;
                    let amount = entry
                        .threshold
                        .as_deref()
                        .map(parse_u256)
                        .transpose()?
                        .unwrap_or(U256::ZERO);
                    Ok((ChainId::from(chain), amount))
                })
                .collect::<Result<HashMap<_, _>, ConfigStoreError>>()
        })
        .transpose()?;

    let route_rate_models = payload
        .route_rate_model
        .map(|m| {
            m.into_iter()
                .map(|(route_key, model_payload)| {
                    let (origin, destination) = parse_route_key(&route_key)?;
                    let model = RateModel::try_from(model_payload)?;
                    Ok(((origin, destination), model))
                })
                .collect::<Result<HashMap<_, _>, ConfigStoreError>>()
        })
        .transpose()?;

    Ok(TokenConfig {
        rate_model,
        transfer_threshold,
        spoke_target_balances,
        route_rate_models,
    })
}

fn parse_route_key(key: &str) -> Result<(ChainId, ChainId), ConfigStoreError> {
    let (origin_str, destination_str) =
        key.split_once('-')
            .ok_or_else(|| ConfigStoreError::MalformedPayload {
                reason: format!("route key must be \"origin-destination\": {key}"),
            })?;
    let origin: u64 = origin_str
        .parse()
        .map_err(|_| ConfigStoreError::MalformedPayload {
            reason: format!("invalid origin chain id in route key: {key}"),
        })?;
    let destination: u64 =
        destination_str
            .parse()
            .map_err(|_| ConfigStoreError::MalformedPayload {
                reason: format!("invalid destination chain id in route key: {key}"),
            })?;
    Ok((ChainId::from(origin), ChainId::from(destination)))
}

/// Parse a global-config value that is simply a JSON array of chain ids —
/// the shape shared by `DISABLED_CHAINS` and `LITE_CHAIN_IDS`.
pub fn parse_chain_id_list(raw_json: &str) -> Result<Vec<ChainId>, ConfigStoreError> {
    let ids: Vec<u64> =
        serde_json::from_str(raw_json).map_err(|e| ConfigStoreError::MalformedPayload {
            reason: e.to_string(),
        })?;
    Ok(ids.into_iter().map(ChainId::from).collect())
}

/// Parse a `DISABLED_CHAINS` global-config value: a JSON array of chain
/// ids, with chain id 1 (the hub) always filtered out regardless of what
/// the payload says.
pub fn parse_disabled_chains(raw_json: &str) -> Result<Vec<ChainId>, ConfigStoreError> {
    Ok(parse_chain_id_list(raw_json)?
        .into_iter()
        .filter(|&id| id != ChainId::HUB)
        .collect())
}
