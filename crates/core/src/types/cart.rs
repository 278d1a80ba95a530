//! Cart data model.
//!
//! These types are what the cart store persists to local key-value storage,
//! so their serde representation is the storage format: camelCase keys,
//! RFC 3339 timestamps, decimal prices as strings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, SellerId};

/// A single product entry in the cart, carrying its own quantity.
///
/// Invariant (enforced by the cart store): at most one line per product id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub original_unit_price: Option<Decimal>,
    pub image_url: String,
    pub brand_name: String,
    /// Always >= 1; a quantity update below 1 removes the line instead.
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub seller_id: Option<SellerId>,
    #[serde(default)]
    pub seller_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Line subtotal: unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// One add-to-cart event, kept in a bounded newest-first ring of five.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentlyAdded {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image_url: String,
    pub added_at: DateTime<Utc>,
    /// Quantity of the line *after* this add.
    pub quantity: u32,
}
