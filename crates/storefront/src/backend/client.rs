//! HTTP client for the hosted document API.
//!
//! Documents live under `/v1/collections/{collection}/documents`; list
//! endpoints accept equality filters as query parameters. Every request
//! carries the project API key. Responses are read as text first so parse
//! failures can be logged with the offending body.

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use showmyfit_core::{NewWishlistEntry, ProductSummary, UserId, WishlistEntry, WishlistEntryId};

use crate::config::BackendConfig;

use super::{BackendError, ProductCatalog, WishlistBackend};

const API_KEY_HEADER: &str = "X-Api-Key";

/// Client for the hosted document backend.
///
/// Cheaply cloneable; clones share one connection pool.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// List responses wrap their documents.
#[derive(Debug, Deserialize)]
struct DocumentList<T> {
    documents: Vec<T>,
}

/// Create payload for a wishlist document: the entry plus its owner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateWishlistDocument<'a> {
    user_id: &'a UserId,
    #[serde(flatten)]
    entry: NewWishlistEntry,
}

impl BackendClient {
    /// Create a new backend client.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            inner: Arc::new(BackendClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.trim_end_matches('/').to_owned(),
                api_key: config.api_key.expose_secret().to_owned(),
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Send a request and parse the JSON response.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = request
            .header(API_KEY_HEADER, &self.inner.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(truncate(&body, 200)));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate(&body, 500),
                "Backend returned non-success status"
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: truncate(&body, 200),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body, 500),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }
}

impl WishlistBackend for BackendClient {
    #[instrument(skip(self), fields(user = %user))]
    async fn list_entries(&self, user: &UserId) -> Result<Vec<WishlistEntry>, BackendError> {
        let request = self
            .inner
            .client
            .get(self.url("/v1/collections/wishlists/documents"))
            .query(&[("userId", user.as_str())]);

        let list: DocumentList<WishlistEntry> = self.execute(request).await?;
        Ok(list.documents)
    }

    #[instrument(skip(self, entry), fields(user = %user, product_id = %entry.product_id))]
    async fn create_entry(
        &self,
        user: &UserId,
        entry: NewWishlistEntry,
    ) -> Result<WishlistEntry, BackendError> {
        let request = self
            .inner
            .client
            .post(self.url("/v1/collections/wishlists/documents"))
            .json(&CreateWishlistDocument { user_id: user, entry });

        self.execute(request).await
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete_entry(&self, id: &WishlistEntryId) -> Result<(), BackendError> {
        let request = self
            .inner
            .client
            .delete(self.url(&format!("/v1/collections/wishlists/documents/{id}")));

        // Delete responses carry an empty JSON object.
        let _: serde_json::Value = self.execute(request).await?;
        Ok(())
    }
}

impl ProductCatalog for BackendClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<ProductSummary>, BackendError> {
        let request = self
            .inner
            .client
            .get(self.url("/v1/collections/products/documents"));

        let list: DocumentList<ProductSummary> = self.execute(request).await?;
        Ok(list.documents)
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let client = BackendClient::new(&BackendConfig {
            base_url: "https://api.showmyfit.test/".to_owned(),
            api_key: SecretString::from("k"),
        });
        assert_eq!(
            client.url("/v1/collections/products/documents"),
            "https://api.showmyfit.test/v1/collections/products/documents"
        );
    }

    #[test]
    fn test_create_document_payload_flattens_entry() {
        let doc = CreateWishlistDocument {
            user_id: &UserId::new("u1"),
            entry: NewWishlistEntry {
                product_id: showmyfit_core::ProductId::new("p1"),
                name: "Wool Coat".to_owned(),
                price: rust_decimal::Decimal::new(9900, 2),
                original_price: None,
                image_url: "https://images.showmyfit.com/p1.jpg".to_owned(),
                brand_name: "Acme".to_owned(),
                category: None,
                seller_id: None,
                seller_name: None,
            },
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["productId"], "p1");
        assert!(json.get("entry").is_none());
    }
}
