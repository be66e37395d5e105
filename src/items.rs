//! Items

use std::{
    fmt::{self, Display, Formatter},
    num::NonZeroU32,
};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier of a cart entry (not the product).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(String);

impl LineItemId {
    /// Wrap a backend identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LineItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LineItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for LineItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A single cart line as returned by the backend.
///
/// Quantity is always at least one; a payload carrying `0` fails to decode rather
/// than being treated as an empty line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Cart entry identifier
    pub id: LineItemId,

    /// Purchased product identifier
    pub product_id: String,

    /// Display name
    pub name: String,

    /// Unit price in major units, as priced by the backend at fetch time
    pub unit_price: Decimal,

    /// Quantity in the cart
    pub quantity: NonZeroU32,

    /// Opaque reference to a display asset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl LineItem {
    /// Creates a new line item without an image reference.
    pub fn new(
        id: impl Into<LineItemId>,
        product_id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: NonZeroU32,
    ) -> Self {
        Self {
            id: id.into(),
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            quantity,
            image_ref: None,
        }
    }

    /// Returns the item with the given image reference.
    #[must_use]
    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }
}
