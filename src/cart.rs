//! Cart

use serde::{Deserialize, Serialize};

use crate::{
    coupons::Coupon,
    items::{LineItem, LineItemId},
};

/// Client-side snapshot of the backend-owned cart.
///
/// Totals are never stored here; see [`crate::pricing::price_cart`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Line items in display order
    #[serde(default)]
    pub items: Vec<LineItem>,

    /// At most one applied coupon
    #[serde(default)]
    pub applied_coupon: Option<Coupon>,
}

impl Cart {
    /// Create a cart from line items, without a coupon.
    pub fn with_items(items: impl Into<Vec<LineItem>>) -> Self {
        Self {
            items: items.into(),
            applied_coupon: None,
        }
    }

    /// Returns the cart with `coupon` applied, replacing any previous coupon.
    #[must_use]
    pub fn with_coupon(mut self, coupon: Coupon) -> Self {
        self.applied_coupon = Some(coupon);
        self
    }

    /// Find a line item by id.
    pub fn item(&self, id: &LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Check whether a line item is present.
    pub fn contains(&self, id: &LineItemId) -> bool {
        self.item(id).is_some()
    }

    /// Iterate over line item ids in display order.
    pub fn item_ids(&self) -> impl Iterator<Item = &LineItemId> {
        self.items.iter().map(|item| &item.id)
    }

    /// Total number of units across all lines.
    pub fn unit_count(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// Get the number of line items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
