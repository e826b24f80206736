//! Fixed-decimal rounding helpers shared by the engine stages.

use crate::types::Amount;
use rust_decimal::{prelude::FromPrimitive, Decimal, RoundingStrategy};

/// Tolerance used when comparing a pattern amount against a balance.
pub const MATCH_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Round half away from zero to `precision` decimal places.
pub fn round_amount(value: Amount, precision: u32) -> Amount {
    value
        .round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero)
}

/// One unit at the configured precision (0.01 at 2 decimals).
pub fn unit(precision: u32) -> Amount {
    Decimal::new(1, precision)
}

/// Snap a residual that is positive but below one unit to zero.
pub fn snap_residual(remaining: Amount, precision: u32) -> Amount {
    if remaining > Decimal::ZERO && remaining < unit(precision) {
        Decimal::ZERO
    } else {
        remaining
    }
}

/// Whether two amounts are equal within [`MATCH_TOLERANCE`].
pub fn approx_eq(a: Amount, b: Amount) -> bool {
    (a - b).abs() < MATCH_TOLERANCE
}

/// Scale `base` by a real factor, saturating at the decimal bounds.
/// Factors that do not fit a decimal (NaN, infinities) leave the base
/// untouched.
pub fn scale(base: Amount, factor: f64) -> Amount {
    Decimal::from_f64(factor).map_or(base, |f| base.saturating_mul(f))
}
