//! Pricing
//!
//! Pure calculations over a cart snapshot. Amounts are computed in minor units of
//! the display currency and never go negative: a fixed coupon larger than the
//! subtotal is clamped to the subtotal, and the final price is floored at zero.

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{
    cart::Cart,
    coupons::{Coupon, DiscountType},
    discounts::{DiscountError, percent_of_minor, percentage_from_points},
    items::{LineItem, LineItemId},
    money::{self, AmountError},
};

/// Errors that can occur while pricing a cart.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// A line item arrived with a negative unit price.
    #[error("line item {0} has a negative unit price")]
    NegativePrice(LineItemId),

    /// A fixed coupon carried a negative amount.
    #[error("fixed discount {0} is negative")]
    NegativeDiscount(Decimal),

    /// Line totals or subtotal overflowed minor units.
    #[error("amount overflowed while pricing the cart")]
    Overflow,

    /// Wrapped amount conversion error.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Wrapped percentage error.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Subtotal, discount and final price of a cart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBreakdown<'a> {
    /// Sum of line totals
    pub subtotal: Money<'a, Currency>,

    /// Coupon discount, never more than `subtotal`
    pub discount: Money<'a, Currency>,

    /// Amount payable, never negative
    pub total: Money<'a, Currency>,
}

impl PriceBreakdown<'_> {
    /// Discount as a fraction of the subtotal (zero for an empty cart).
    pub fn savings_percent(&self) -> Percentage {
        let subtotal_minor = self.subtotal.to_minor_units();

        if subtotal_minor == 0 {
            return Percentage::from(0.0);
        }

        let discount_dec =
            Decimal::from_i64(self.discount.to_minor_units()).unwrap_or(Decimal::ZERO);
        let subtotal_dec = Decimal::from_i64(subtotal_minor).unwrap_or(Decimal::ZERO);

        Percentage::from(discount_dec / subtotal_dec)
    }
}

/// Price of a single line (`unit_price × quantity`).
///
/// # Errors
///
/// - [`PricingError::NegativePrice`]: the unit price is below zero.
/// - [`PricingError::Overflow`] / [`PricingError::Amount`]: the line total overflows.
pub fn line_total<'a>(
    item: &LineItem,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, PricingError> {
    Ok(Money::from_minor(line_total_minor(item, currency)?, currency))
}

/// Sum of `unit_price × quantity` over all items. An empty list is zero.
///
/// # Errors
///
/// - [`PricingError::NegativePrice`]: some unit price is below zero.
/// - [`PricingError::Overflow`] / [`PricingError::Amount`]: the sum overflows.
pub fn compute_subtotal<'a>(
    items: &[LineItem],
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, PricingError> {
    let subtotal = items.iter().try_fold(0_i64, |acc, item| {
        acc.checked_add(line_total_minor(item, currency)?)
            .ok_or(PricingError::Overflow)
    })?;

    Ok(Money::from_minor(subtotal, currency))
}

/// Discount granted by `coupon` on `subtotal`.
///
/// Percentage coupons take `subtotal × value / 100`, rounded half-up to the
/// minor unit. Fixed coupons take `value`, clamped to `subtotal`.
///
/// # Errors
///
/// - [`PricingError::Discount`]: a percentage outside `0..=100`.
/// - [`PricingError::NegativeDiscount`]: a negative fixed amount.
/// - [`PricingError::Amount`]: a fixed amount that overflows minor units.
pub fn compute_discount<'a>(
    subtotal: &Money<'a, Currency>,
    coupon: Option<&Coupon>,
) -> Result<Money<'a, Currency>, PricingError> {
    let currency = subtotal.currency();

    let Some(coupon) = coupon else {
        return Ok(money::zero(currency));
    };

    let subtotal_minor = subtotal.to_minor_units().max(0);

    let discount_minor = match coupon.discount_type {
        DiscountType::Percentage => {
            let percent = percentage_from_points(coupon.discount_value)?;
            percent_of_minor(&percent, subtotal_minor)?
        }
        DiscountType::Fixed => {
            if coupon.discount_value < Decimal::ZERO {
                return Err(PricingError::NegativeDiscount(coupon.discount_value));
            }

            money::to_minor(coupon.discount_value, currency)?.min(subtotal_minor)
        }
    };

    Ok(Money::from_minor(discount_minor, currency))
}

/// `max(0, subtotal - discount)`.
///
/// # Errors
///
/// Returns [`PricingError::Money`] if the two amounts have different currencies.
pub fn compute_final_price<'a>(
    subtotal: Money<'a, Currency>,
    discount: Money<'a, Currency>,
) -> Result<Money<'a, Currency>, PricingError> {
    let remaining = subtotal.sub(discount)?;

    if remaining.to_minor_units() < 0 {
        return Ok(money::zero(subtotal.currency()));
    }

    Ok(remaining)
}

/// Price a cart snapshot in `currency`.
///
/// # Errors
///
/// Propagates any error from [`compute_subtotal`], [`compute_discount`] or
/// [`compute_final_price`].
pub fn price_cart<'a>(
    cart: &Cart,
    currency: &'a Currency,
) -> Result<PriceBreakdown<'a>, PricingError> {
    let subtotal = compute_subtotal(&cart.items, currency)?;
    let discount = compute_discount(&subtotal, cart.applied_coupon.as_ref())?;
    let total = compute_final_price(subtotal, discount)?;

    Ok(PriceBreakdown {
        subtotal,
        discount,
        total,
    })
}

fn line_total_minor(item: &LineItem, currency: &Currency) -> Result<i64, PricingError> {
    if item.unit_price < Decimal::ZERO {
        return Err(PricingError::NegativePrice(item.id.clone()));
    }

    money::to_minor(item.unit_price, currency)?
        .checked_mul(i64::from(item.quantity.get()))
        .ok_or(PricingError::Overflow)
}
