//! Application state wiring.
//!
//! [`Storefront`] builds every store from one [`StorefrontConfig`] and hands
//! out handles. All stores backed by local persistence share a single
//! [`FileStorage`] so the cart and the image cache land in the same file.

use std::sync::Arc;

use crate::backend::BackendClient;
use crate::clock::SystemClock;
use crate::config::StorefrontConfig;
use crate::images::{ImageResolver, ImageUrlCache};
use crate::search::SuggestionEngine;
use crate::storage::FileStorage;
use crate::stores::{CartStore, WishlistStore};

/// The fully wired storefront.
///
/// Cheaply cloneable; clones share every store.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    cart: CartStore<FileStorage, SystemClock>,
    wishlist: WishlistStore<BackendClient>,
    images: ImageResolver<FileStorage, SystemClock>,
    suggestions: SuggestionEngine<BackendClient>,
}

impl Storefront {
    /// Wire up all stores from configuration.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let storage = FileStorage::open(&config.storage_path);
        let backend = BackendClient::new(&config.backend);

        let cart = CartStore::new(storage.clone(), SystemClock);
        let wishlist = WishlistStore::new(backend.clone());
        let images = ImageResolver::new(ImageUrlCache::with_ttl(
            storage,
            SystemClock,
            config.image_cache_ttl,
        ));
        let suggestions = SuggestionEngine::new(backend);

        Self {
            inner: Arc::new(StorefrontInner {
                config,
                cart,
                wishlist,
                images,
                suggestions,
            }),
        }
    }

    /// The configuration this storefront was built from.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The locally persisted shopping cart.
    #[must_use]
    pub fn cart(&self) -> &CartStore<FileStorage, SystemClock> {
        &self.inner.cart
    }

    /// The backend-synced wishlist.
    #[must_use]
    pub fn wishlist(&self) -> &WishlistStore<BackendClient> {
        &self.inner.wishlist
    }

    /// The optimized image URL resolver.
    #[must_use]
    pub fn images(&self) -> &ImageResolver<FileStorage, SystemClock> {
        &self.inner.images
    }

    /// Product search suggestions.
    #[must_use]
    pub fn suggestions(&self) -> &SuggestionEngine<BackendClient> {
        &self.inner.suggestions
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use secrecy::SecretString;

    fn test_config(storage_path: std::path::PathBuf) -> StorefrontConfig {
        StorefrontConfig {
            backend: BackendConfig {
                base_url: "https://api.showmyfit.test".to_owned(),
                api_key: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6"),
            },
            storage_path,
            image_cache_ttl: std::time::Duration::from_secs(24 * 3600),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    fn test_item() -> crate::stores::CartItemInput {
        crate::stores::CartItemInput {
            id: showmyfit_core::ProductId::new("p1"),
            name: "Wool Coat".to_owned(),
            unit_price: rust_decimal::Decimal::from(99),
            original_unit_price: None,
            image_url: String::new(),
            brand_name: "Acme".to_owned(),
            size: None,
            color: None,
            seller_id: None,
            seller_name: None,
            category: None,
        }
    }

    #[tokio::test]
    async fn test_cart_and_images_share_one_storage_file() {
        let path = std::env::temp_dir().join(format!("smf-state-{}.json", uuid::Uuid::new_v4()));
        let storefront = Storefront::new(test_config(path.clone()));

        storefront.cart().add(test_item());
        storefront
            .images()
            .resolve("https://images.unsplash.com/photo-1", Some(400), None)
            .await;

        // Both stores wrote through the same file.
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("cart"));
        assert!(raw.contains("smf:img:v1:"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_storefront_clones_share_state() {
        let path = std::env::temp_dir().join(format!("smf-clone-{}.json", uuid::Uuid::new_v4()));
        let storefront = Storefront::new(test_config(path.clone()));
        let clone = storefront.clone();

        storefront.cart().add(test_item());

        assert_eq!(clone.cart().item_count(), 1);
        std::fs::remove_file(&path).ok();
    }
}
