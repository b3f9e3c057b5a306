//! Realized LP fee computation: `average_rate` integrates the ConfigStore's
//! piecewise-linear rate model (flat `r0` below the kink, steeper slope `r1`
//! to the kink, a further slope `r2` beyond it) across the utilization
//! interval a deposit moves the pool through, averaged over the interval
//! rather than evaluated at a single point so a large deposit's fee
//! reflects the liquidity it actually consumes. Only referential
//! transparency with respect to the rate-model state at a deposit's quote
//! block is required — callers (`bundle_reconstructor`'s Phase 7) resolve
//! the rate model for the fill's actual origin/destination route and feed
//! it in; this module has no opinion on which route a caller asks for.

use alloy_primitives::U256;
use bridge_types::ONE_E18;
use config_store::RateModel;

fn mul_div(a: U256, b: U256, denom: U256) -> U256 {
    if denom.is_zero() {
        return U256::ZERO;
    }
    a.saturating_mul(b) / denom
}

/// `rate(u)`, 1e18-scaled, for utilization `u` also 1e18-scaled.
fn rate_at(model: &RateModel, u: U256) -> U256 {
    if u <= model.u_kink {
        let ratio = mul_div(u, ONE_E18, model.u_kink.max(U256::from(1u64)));
        model.r0 + mul_div(model.r1, ratio, ONE_E18)
    } else {
        let span = ONE_E18.saturating_sub(model.u_kink).max(U256::from(1u64));
        let ratio = mul_div(u.saturating_sub(model.u_kink), ONE_E18, span);
        model.r0 + model.r1 + mul_div(model.r2, ratio, ONE_E18)
    }
}

/// The average rate over `[low, high]`, trapezoidal, split at the kink when
/// the interval straddles it (the curve is linear on either side of the
/// kink, so a trapezoid is the exact integral average on each side).
pub fn average_rate(model: &RateModel, utilization_before: U256, utilization_after: U256) -> U256 {
    let (low, high) = if utilization_before <= utilization_after {
        (utilization_before, utilization_after)
    } else {
        (utilization_after, utilization_before)
    };

    if low == high {
        return rate_at(model, low);
    }

    if high <= model.u_kink || low >= model.u_kink {
        return (rate_at(model, low) + rate_at(model, high)) / U256::from(2u64);
    }

    let kink = model.u_kink;
    let rate_kink = rate_at(model, kink);
    let pre_len = kink - low;
    let post_len = high - kink;
    let total_len = high - low;

    let avg_pre = (rate_at(model, low) + rate_kink) / U256::from(2u64);
    let avg_post = (rate_kink + rate_at(model, high)) / U256::from(2u64);

    mul_div(avg_pre, pre_len, total_len) + mul_div(avg_post, post_len, total_len)
}
