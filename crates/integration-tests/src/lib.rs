//! Integration tests for ShowMyFit.
//!
//! Exercises the storefront library end to end: stores wired over real
//! storage adapters and an in-memory document backend, verifying the flows
//! a session goes through (fill a cart, restart, sign in, save to the
//! wishlist, browse with suggestions) rather than single modules.
//!
//! The scenarios live under `tests/`; this crate holds the shared fixtures.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rust_decimal::Decimal;

use showmyfit_core::{
    NewWishlistEntry, ProductId, ProductStatus, ProductSummary, UserId, WishlistEntry,
    WishlistEntryId,
};
use showmyfit_storefront::backend::{BackendError, ProductCatalog, WishlistBackend};
use showmyfit_storefront::stores::CartItemInput;

/// In-memory stand-in for the hosted document backend.
///
/// Serves a fixed `products` collection and a mutable `wishlists`
/// collection. Cheaply cloneable; clones share state, mirroring how one
/// backend serves every store in the app.
#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<FakeBackendInner>,
}

#[derive(Default)]
struct FakeBackendInner {
    products: Mutex<Vec<ProductSummary>>,
    wishlist_docs: Mutex<Vec<(UserId, WishlistEntry)>>,
    next_doc_id: AtomicUsize,
    fail: AtomicBool,
    catalog_calls: AtomicUsize,
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend serving the given product catalog.
    #[must_use]
    pub fn with_products(products: Vec<ProductSummary>) -> Self {
        let backend = Self::new();
        *backend.lock_products() = products;
        backend
    }

    /// Make every subsequent call fail with an HTTP 500 (or stop, if false).
    pub fn set_failing(&self, failing: bool) {
        self.inner.fail.store(failing, Ordering::SeqCst);
    }

    /// Seed a wishlist document directly, bypassing the create endpoint.
    pub fn seed_wishlist_entry(&self, user: &UserId, entry: WishlistEntry) {
        self.lock_wishlist().push((user.clone(), entry));
    }

    /// Number of wishlist documents across all users.
    #[must_use]
    pub fn wishlist_doc_count(&self) -> usize {
        self.lock_wishlist().len()
    }

    /// How many times the product listing was fetched.
    #[must_use]
    pub fn catalog_calls(&self) -> usize {
        self.inner.catalog_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.inner.fail.load(Ordering::SeqCst) {
            return Err(BackendError::Status {
                status: 500,
                message: "fake backend set to fail".to_owned(),
            });
        }
        Ok(())
    }

    fn lock_products(&self) -> MutexGuard<'_, Vec<ProductSummary>> {
        self.inner
            .products
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_wishlist(&self) -> MutexGuard<'_, Vec<(UserId, WishlistEntry)>> {
        self.inner
            .wishlist_docs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl WishlistBackend for FakeBackend {
    async fn list_entries(&self, user: &UserId) -> Result<Vec<WishlistEntry>, BackendError> {
        self.check_available()?;
        Ok(self
            .lock_wishlist()
            .iter()
            .filter(|(owner, _)| owner == user)
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    async fn create_entry(
        &self,
        user: &UserId,
        entry: NewWishlistEntry,
    ) -> Result<WishlistEntry, BackendError> {
        self.check_available()?;
        let doc_id = self.inner.next_doc_id.fetch_add(1, Ordering::SeqCst);
        let created = WishlistEntry {
            id: WishlistEntryId::new(format!("doc-{doc_id}")),
            product_id: entry.product_id,
            name: entry.name,
            price: entry.price,
            original_price: entry.original_price,
            image_url: entry.image_url,
            brand_name: entry.brand_name,
            category: entry.category,
            seller_id: entry.seller_id,
            seller_name: entry.seller_name,
            added_at: Utc::now(),
        };
        self.lock_wishlist().push((user.clone(), created.clone()));
        Ok(created)
    }

    async fn delete_entry(&self, id: &WishlistEntryId) -> Result<(), BackendError> {
        self.check_available()?;
        self.lock_wishlist().retain(|(_, entry)| &entry.id != id);
        Ok(())
    }
}

impl ProductCatalog for FakeBackend {
    async fn list_products(&self) -> Result<Vec<ProductSummary>, BackendError> {
        self.inner.catalog_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.lock_products().clone())
    }
}

// =============================================================================
// Fixture Builders
// =============================================================================

/// A listed product with sensible defaults.
#[must_use]
pub fn product(id: &str, name: &str, brand: &str) -> ProductSummary {
    ProductSummary {
        id: ProductId::new(id),
        name: name.to_owned(),
        brand: brand.to_owned(),
        category: Some("Outerwear".to_owned()),
        description: String::new(),
        price: Decimal::new(4999, 2),
        image: format!("https://images.showmyfit.com/{id}.jpg"),
        status: ProductStatus::Active,
        seller_id: None,
        seller_name: None,
    }
}

/// The same product marked with a non-active status.
#[must_use]
pub fn product_with_status(
    id: &str,
    name: &str,
    brand: &str,
    status: ProductStatus,
) -> ProductSummary {
    ProductSummary {
        status,
        ..product(id, name, brand)
    }
}

/// An add-to-cart payload for the given product id.
#[must_use]
pub fn cart_item(id: &str, price: Decimal) -> CartItemInput {
    CartItemInput {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        unit_price: price,
        original_unit_price: None,
        image_url: format!("https://images.showmyfit.com/{id}.jpg"),
        brand_name: "Acme".to_owned(),
        size: Some("M".to_owned()),
        color: None,
        seller_id: None,
        seller_name: None,
        category: None,
    }
}

/// A wishlist create payload for the given product id.
#[must_use]
pub fn wishlist_item(id: &str) -> NewWishlistEntry {
    NewWishlistEntry {
        product_id: ProductId::new(id),
        name: format!("Product {id}"),
        price: Decimal::new(2500, 2),
        original_price: None,
        image_url: format!("https://images.showmyfit.com/{id}.jpg"),
        brand_name: "Acme".to_owned(),
        category: None,
        seller_id: None,
        seller_name: None,
    }
}
