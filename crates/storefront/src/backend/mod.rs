//! Hosted document backend.
//!
//! The storefront delegates persistence and querying of shared data to a
//! hosted document API: a `wishlists` collection scoped per user and a
//! read-only `products` collection. [`BackendClient`] is the production
//! implementation; the [`WishlistBackend`] and [`ProductCatalog`] traits are
//! the seams the stores are written against, so tests can substitute an
//! in-memory fake.

mod client;

pub use client::BackendClient;

use showmyfit_core::{NewWishlistEntry, ProductSummary, UserId, WishlistEntry, WishlistEntryId};
use thiserror::Error;

/// Errors from the hosted backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be parsed.
    #[error("Failed to parse backend response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Backend asked us to slow down.
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// Document or collection does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success response.
    #[error("Backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
}

/// Remote operations on the `wishlists` collection.
#[allow(async_fn_in_trait)]
pub trait WishlistBackend: Send + Sync + 'static {
    /// All wishlist documents belonging to `user`, in unspecified order.
    async fn list_entries(&self, user: &UserId) -> Result<Vec<WishlistEntry>, BackendError>;

    /// Create a document for `user`; the backend assigns the document id.
    async fn create_entry(
        &self,
        user: &UserId,
        entry: NewWishlistEntry,
    ) -> Result<WishlistEntry, BackendError>;

    /// Delete a document by id.
    async fn delete_entry(&self, id: &WishlistEntryId) -> Result<(), BackendError>;
}

/// Read access to the `products` collection.
#[allow(async_fn_in_trait)]
pub trait ProductCatalog: Send + Sync + 'static {
    /// The full product listing (the catalog is small and curated).
    async fn list_products(&self) -> Result<Vec<ProductSummary>, BackendError>;
}
