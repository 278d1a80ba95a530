//! Wishlist data model.
//!
//! Wishlist entries live in the hosted `wishlists` document collection,
//! keyed by a backend-generated id and scoped to a user. `WishlistEntry` is
//! the document as read back; `NewWishlistEntry` is the payload sent on
//! create (the backend assigns `id` and `userId`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, SellerId, WishlistEntryId};

/// A wishlist document as stored remotely.
///
/// Invariant (enforced by the wishlist store): at most one entry per
/// (user, product id) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    /// Backend-generated document id, distinct from the product id.
    pub id: WishlistEntryId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    pub image_url: String,
    pub brand_name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub seller_id: Option<SellerId>,
    #[serde(default)]
    pub seller_name: Option<String>,
    pub added_at: DateTime<Utc>,
}

/// Payload for creating a wishlist document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWishlistEntry {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    pub image_url: String,
    pub brand_name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub seller_id: Option<SellerId>,
    #[serde(default)]
    pub seller_name: Option<String>,
}
