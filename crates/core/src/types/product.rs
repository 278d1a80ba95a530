//! Product catalog types.
//!
//! `ProductSummary` mirrors the fields of a document in the hosted
//! `products` collection that the storefront reads: enough for search
//! suggestions and for seeding cart/wishlist entries. Field names on the
//! wire are camelCase.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, SellerId};
use super::price::{CurrencyCode, Price};

/// Listing status of a product document.
///
/// Only `Active` products are surfaced in search suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Sold,
    Archived,
}

/// A read-only view of a product document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    /// Source URL of the primary product image.
    pub image: String,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub seller_id: Option<SellerId>,
    #[serde(default)]
    pub seller_name: Option<String>,
}

impl ProductSummary {
    /// The listed price as a displayable tag. The catalog prices in USD.
    #[must_use]
    pub const fn price_tag(&self) -> Price {
        Price::new(self.price, CurrencyCode::USD)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_summary_deserializes_sparse_document() {
        // Documents curated by hand often omit optional fields.
        let json = r#"{
            "id": "p1",
            "name": "Linen Shirt",
            "brand": "Acme",
            "price": "49.99",
            "image": "https://images.showmyfit.com/p1.jpg"
        }"#;
        let product: ProductSummary = serde_json::from_str(json).unwrap();
        assert_eq!(product.status, ProductStatus::Active);
        assert!(product.category.is_none());
        assert_eq!(product.description, "");
        assert_eq!(product.price_tag().display(), "$49.99");
    }

    #[test]
    fn test_product_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&ProductStatus::Sold).unwrap(),
            "\"sold\""
        );
    }
}
