//! Money
//!
//! Conversions between backend decimal amounts and minor units. Every amount the
//! crate computes or displays goes through [`to_minor`], so a single rounding rule
//! (half-up at the currency exponent) applies everywhere.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Findable, Money, iso::Currency};
use thiserror::Error;

/// Errors converting amounts or currency codes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    /// The amount does not fit in minor units of the currency.
    #[error("amount {0} cannot be represented in minor units")]
    OutOfRange(Decimal),

    /// The currency code is not a known ISO 4217 code.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// Look up an ISO currency by its alphabetic code (case-insensitive).
///
/// # Errors
///
/// Returns [`AmountError::UnknownCurrency`] when the code is not recognised.
pub fn find_currency(code: &str) -> Result<&'static Currency, AmountError> {
    Currency::find(&code.trim().to_ascii_uppercase())
        .ok_or_else(|| AmountError::UnknownCurrency(code.to_string()))
}

/// Convert a decimal amount into minor units, rounding half-up at the currency exponent.
///
/// # Errors
///
/// Returns [`AmountError::OutOfRange`] if the scaled amount overflows `i64`.
pub fn to_minor(amount: Decimal, currency: &Currency) -> Result<i64, AmountError> {
    let scale = 10_i64
        .checked_pow(currency.exponent)
        .map(Decimal::from)
        .ok_or(AmountError::OutOfRange(amount))?;

    amount
        .checked_mul(scale)
        .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|rounded| rounded.to_i64())
        .ok_or(AmountError::OutOfRange(amount))
}

/// Build a [`Money`] value from a decimal amount.
///
/// # Errors
///
/// Returns [`AmountError::OutOfRange`] if the amount overflows minor units.
pub fn from_decimal(
    amount: Decimal,
    currency: &Currency,
) -> Result<Money<'_, Currency>, AmountError> {
    Ok(Money::from_minor(to_minor(amount, currency)?, currency))
}

/// Zero in the given currency.
pub fn zero(currency: &Currency) -> Money<'_, Currency> {
    Money::from_minor(0, currency)
}
