//! Coupons

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a coupon's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiscountType {
    /// `discount_value` is a percentage of the subtotal (0–100).
    #[serde(alias = "percentage", alias = "Percentage")]
    Percentage,

    /// `discount_value` is an absolute amount in major units.
    #[serde(alias = "fixed", alias = "Fixed")]
    Fixed,
}

/// Snapshot of a coupon as applied by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Human-entered code, case-sensitive as stored
    pub code: String,

    /// Discount kind
    pub discount_type: DiscountType,

    /// Percentage points or absolute amount, depending on `discount_type`
    pub discount_value: Decimal,
}

impl Coupon {
    /// Percentage coupon, e.g. `Coupon::percentage("TENOFF", 10.into())`.
    pub fn percentage(code: impl Into<String>, points: Decimal) -> Self {
        Self {
            code: code.into(),
            discount_type: DiscountType::Percentage,
            discount_value: points,
        }
    }

    /// Fixed amount coupon.
    pub fn fixed(code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            code: code.into(),
            discount_type: DiscountType::Fixed,
            discount_value: amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn deserializes_backend_snapshot() -> TestResult {
        let coupon: Coupon = serde_json::from_str(
            r#"{"code":"Promo10","discountType":"PERCENTAGE","discountValue":10}"#,
        )?;

        assert_eq!(coupon, Coupon::percentage("Promo10", Decimal::new(10, 0)));

        Ok(())
    }

    #[test]
    fn discount_type_accepts_lowercase() -> TestResult {
        let kind: DiscountType = serde_json::from_str(r#""fixed""#)?;

        assert_eq!(kind, DiscountType::Fixed);

        Ok(())
    }

    #[test]
    fn code_keeps_its_case() -> TestResult {
        let coupon: Coupon = serde_json::from_str(
            r#"{"code":"MiXeD","discountType":"FIXED","discountValue":"100000"}"#,
        )?;

        assert_eq!(coupon.code, "MiXeD");
        assert_eq!(coupon.discount_value, Decimal::new(100_000, 0));

        Ok(())
    }
}
