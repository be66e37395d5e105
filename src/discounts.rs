//! Discounts
//!
//! Percentage arithmetic shared by coupon pricing.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use thiserror::Error;

/// Errors specific to discount calculations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Percentage coupon value outside `0..=100`.
    #[error("percentage discount {0} is outside 0..=100")]
    PercentOutOfRange(Decimal),
}

/// Convert a coupon's percentage points (e.g. `10` for 10%) into a [`Percentage`].
///
/// # Errors
///
/// Returns [`DiscountError::PercentOutOfRange`] if `points` is negative or above 100.
pub fn percentage_from_points(points: Decimal) -> Result<Percentage, DiscountError> {
    if points < Decimal::ZERO || points > Decimal::ONE_HUNDRED {
        return Err(DiscountError::PercentOutOfRange(points));
    }

    Ok(Percentage::from(points / Decimal::ONE_HUNDRED))
}

/// Calculate the discount amount in minor units based on a percentage and a minor unit amount.
///
/// Rounds half-up (away from zero) to the nearest minor unit.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage doesn't expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}
