//! Fixtures
//!
//! YAML cart descriptions for offline quotes and tests:
//!
//! ```yaml
//! currency: IDR
//! items:
//!   - id: li-1
//!     product: card-001
//!     name: Holo Dragon
//!     price: 200000 IDR
//!     quantity: 1
//! coupons:
//!   - code: HALF
//!     type: fixed
//!     value: 100000
//! apply: HALF
//! ```

use std::{fs, num::NonZeroU32, path::Path};

use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    cart::Cart,
    coupons::{Coupon, DiscountType},
    items::LineItem,
    money::{self, AmountError},
};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error(transparent)]
    Currency(#[from] AmountError),

    /// Currency mismatch between items
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No currency given and no items to infer it from
    #[error("No currency given and no items to infer it from")]
    NoCurrency,

    /// Quantity of zero
    #[error("Item {0} has quantity 0")]
    ZeroQuantity(String),
}

/// Top-level cart fixture.
#[derive(Debug, Deserialize)]
pub struct CartFixture {
    /// Display currency; inferred from item prices when omitted
    #[serde(default)]
    pub currency: Option<String>,

    /// Cart lines
    #[serde(default)]
    pub items: Vec<ItemFixture>,

    /// Coupons the backend would accept
    #[serde(default)]
    pub coupons: Vec<CouponFixture>,

    /// Coupon code to apply when quoting
    #[serde(default)]
    pub apply: Option<String>,
}

/// Cart line fixture.
#[derive(Debug, Deserialize)]
pub struct ItemFixture {
    /// Line id
    pub id: String,

    /// Product id
    pub product: String,

    /// Display name
    pub name: String,

    /// Unit price (e.g. `"200000 IDR"`)
    pub price: String,

    /// Quantity
    pub quantity: u32,
}

/// Coupon fixture.
#[derive(Debug, Deserialize)]
pub struct CouponFixture {
    /// Code
    pub code: String,

    /// `percentage` or `fixed`
    #[serde(rename = "type")]
    pub discount_type: DiscountType,

    /// Percentage points or major-unit amount
    pub value: Decimal,
}

/// A fixture resolved into domain types.
#[derive(Debug, Clone)]
pub struct LoadedFixture {
    /// Cart as the backend would serve it, with no coupon applied
    pub cart: Cart,

    /// Display currency
    pub currency: &'static Currency,

    /// Coupons the backend accepts
    pub coupons: Vec<Coupon>,

    /// Coupon to apply, if any
    pub apply: Option<String>,
}

impl CartFixture {
    /// Read and parse a fixture file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Parse a fixture from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse(yaml: &str) -> Result<Self, FixtureError> {
        Ok(serde_norway::from_str(yaml)?)
    }

    /// Resolve prices, currency and coupons.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed prices, unknown or mixed currencies, and
    /// zero quantities.
    pub fn load(self) -> Result<LoadedFixture, FixtureError> {
        let mut currency = self
            .currency
            .as_deref()
            .map(money::find_currency)
            .transpose()?;

        let mut items = Vec::with_capacity(self.items.len());

        for fixture in self.items {
            let (amount, item_currency) = parse_price(&fixture.price)?;

            match currency {
                Some(expected) if expected != item_currency => {
                    return Err(FixtureError::CurrencyMismatch(
                        expected.iso_alpha_code.to_string(),
                        item_currency.iso_alpha_code.to_string(),
                    ));
                }
                Some(_) => {}
                None => currency = Some(item_currency),
            }

            let quantity = NonZeroU32::new(fixture.quantity)
                .ok_or_else(|| FixtureError::ZeroQuantity(fixture.id.clone()))?;

            items.push(LineItem::new(
                fixture.id,
                fixture.product,
                fixture.name,
                amount,
                quantity,
            ));
        }

        let coupons = self
            .coupons
            .into_iter()
            .map(|coupon| Coupon {
                code: coupon.code,
                discount_type: coupon.discount_type,
                discount_value: coupon.value,
            })
            .collect();

        Ok(LoadedFixture {
            cart: Cart::with_items(items),
            currency: currency.ok_or(FixtureError::NoCurrency)?,
            coupons,
            apply: self.apply,
        })
    }
}

/// Parse price string (e.g. `"200000 IDR"`) into a decimal amount and currency.
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY", if the
/// amount is not a decimal, or if the currency code is not recognised.
pub fn parse_price(s: &str) -> Result<(Decimal, &'static Currency), FixtureError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((amount, money::find_currency(code)?))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rusty_money::iso::{IDR, USD};
    use testresult::TestResult;

    use super::*;

    const FIXTURE: &str = r"
items:
  - id: li-1
    product: card-001
    name: Holo Dragon
    price: 100000 IDR
    quantity: 2
  - id: li-2
    product: card-002
    name: Foil Knight
    price: 50000 IDR
    quantity: 3
coupons:
  - code: TEN
    type: percentage
    value: 10
apply: TEN
";

    #[test]
    fn parse_price_reads_amount_and_currency() -> TestResult {
        let (amount, currency) = parse_price("19.99 USD")?;

        assert_eq!(amount, Decimal::new(1999, 2));
        assert_eq!(currency, USD);

        Ok(())
    }

    #[test]
    fn parse_price_rejects_invalid_format() {
        assert!(matches!(
            parse_price("19.99USD"),
            Err(FixtureError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_price("1 USD extra"),
            Err(FixtureError::InvalidPrice(_))
        ));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        assert!(matches!(
            parse_price("1 QQQ"),
            Err(FixtureError::Currency(AmountError::UnknownCurrency(_)))
        ));
    }

    #[test]
    fn load_infers_currency_and_coupons() -> TestResult {
        let loaded = CartFixture::parse(FIXTURE)?.load()?;

        assert_eq!(loaded.currency, IDR);
        assert_eq!(loaded.cart.len(), 2);
        assert!(loaded.cart.applied_coupon.is_none());
        assert_eq!(
            loaded.coupons,
            vec![Coupon::percentage("TEN", Decimal::new(10, 0))]
        );
        assert_eq!(loaded.apply.as_deref(), Some("TEN"));

        Ok(())
    }

    #[test]
    fn load_rejects_mixed_currencies() -> TestResult {
        let fixture = CartFixture::parse(
            r"
items:
  - { id: a, product: p, name: A, price: 1 IDR, quantity: 1 }
  - { id: b, product: p, name: B, price: 1 USD, quantity: 1 }
",
        )?;

        assert!(matches!(
            fixture.load(),
            Err(FixtureError::CurrencyMismatch(expected, found)) if expected == "IDR" && found == "USD"
        ));

        Ok(())
    }

    #[test]
    fn load_rejects_zero_quantity() -> TestResult {
        let fixture = CartFixture::parse(
            r"
items:
  - { id: a, product: p, name: A, price: 1 IDR, quantity: 0 }
",
        )?;

        assert!(matches!(fixture.load(), Err(FixtureError::ZeroQuantity(id)) if id == "a"));

        Ok(())
    }

    #[test]
    fn empty_fixture_needs_explicit_currency() -> TestResult {
        assert!(matches!(
            CartFixture::parse("items: []")?.load(),
            Err(FixtureError::NoCurrency)
        ));
        assert_eq!(CartFixture::parse("currency: usd")?.load()?.currency, USD);

        Ok(())
    }

    #[test]
    fn from_path_reads_file() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(FIXTURE.as_bytes())?;

        let loaded = CartFixture::from_path(file.path())?.load()?;

        assert_eq!(loaded.cart.unit_count(), 5);

        Ok(())
    }
}
