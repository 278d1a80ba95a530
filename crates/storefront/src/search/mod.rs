//! Product search suggestions.
//!
//! Type-ahead suggestions over the hosted `products` collection. The full
//! catalog listing is small, so matching happens locally: fetch once, cache
//! for five minutes, and filter per keystroke. Only active products are
//! suggested, and a query matches on name, brand, category, or description,
//! case-insensitively.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::instrument;

use showmyfit_core::{ProductStatus, ProductSummary};

use crate::backend::ProductCatalog;
use crate::error::{AppError, Result, report};

/// How long a fetched catalog snapshot is served before re-fetching.
const CATALOG_TTL: Duration = Duration::from_secs(300);

/// At most this many suggestions per query.
const MAX_SUGGESTIONS: usize = 8;

/// Cache key for the single catalog snapshot.
const CATALOG_KEY: &str = "catalog";

/// Suggestion engine handle.
///
/// Cheaply cloneable; clones share the catalog cache.
#[derive(Clone)]
pub struct SuggestionEngine<C> {
    inner: Arc<SuggestionInner<C>>,
}

struct SuggestionInner<C> {
    catalog: C,
    cache: Cache<&'static str, Arc<Vec<ProductSummary>>>,
}

impl<C: ProductCatalog> SuggestionEngine<C> {
    /// Create a new suggestion engine over a product catalog.
    #[must_use]
    pub fn new(catalog: C) -> Self {
        Self {
            inner: Arc::new(SuggestionInner {
                catalog,
                cache: Cache::builder()
                    .max_capacity(1)
                    .time_to_live(CATALOG_TTL)
                    .build(),
            }),
        }
    }

    /// Suggestions for a partial query, best matches first, capped at 8.
    ///
    /// A blank query yields no suggestions without touching the catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Backend` when the catalog fetch fails and no
    /// cached snapshot is available.
    #[instrument(skip(self))]
    pub async fn suggestions(&self, query: &str) -> Result<Vec<ProductSummary>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let products = self.catalog_snapshot().await?;

        Ok(products
            .iter()
            .filter(|p| p.status == ProductStatus::Active && matches_query(p, &needle))
            .take(MAX_SUGGESTIONS)
            .cloned()
            .collect())
    }

    /// The cached catalog, fetching on miss or expiry. Failures are not
    /// cached, so the next query retries.
    async fn catalog_snapshot(&self) -> Result<Arc<Vec<ProductSummary>>> {
        if let Some(products) = self.inner.cache.get(CATALOG_KEY).await {
            return Ok(products);
        }

        match self.inner.catalog.list_products().await {
            Ok(products) => {
                let products = Arc::new(products);
                self.inner
                    .cache
                    .insert(CATALOG_KEY, Arc::clone(&products))
                    .await;
                Ok(products)
            }
            Err(e) => {
                let err = AppError::Backend(e);
                report(&err);
                Err(err)
            }
        }
    }
}

/// Case-insensitive substring match across the searchable fields.
fn matches_query(product: &ProductSummary, needle: &str) -> bool {
    let haystacks = [
        Some(product.name.as_str()),
        Some(product.brand.as_str()),
        product.category.as_deref(),
        Some(product.description.as_str()),
    ];
    haystacks
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}
