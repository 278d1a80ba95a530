//! Wishlist store.
//!
//! Local mirror of the signed-in user's `wishlists` documents. Mutations
//! require an identity and go remote-first: the local mirror only changes
//! after the backend call succeeds, so a failed call leaves state untouched.
//!
//! Identity changes discard local state and re-fetch. Every fetch is tagged
//! with a generation captured when it was issued; a response whose
//! generation no longer matches is discarded, so a slow fetch for a previous
//! identity can never populate the next one's wishlist.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument};

use showmyfit_core::{NewWishlistEntry, ProductId, UserId, WishlistEntry};

use crate::backend::WishlistBackend;
use crate::error::{AppError, Result, report};

#[derive(Debug, Default)]
struct WishlistState {
    identity: Option<UserId>,
    entries: Vec<WishlistEntry>,
    loading: bool,
    /// Bumped on every identity change; stale fetches fail the tag check.
    generation: u64,
}

/// Wishlist store handle.
///
/// Cheaply cloneable; clones share the same state and backend.
#[derive(Clone)]
pub struct WishlistStore<B> {
    inner: Arc<WishlistInner<B>>,
}

struct WishlistInner<B> {
    backend: B,
    state: Mutex<WishlistState>,
}

impl<B: WishlistBackend> WishlistStore<B> {
    /// Create a signed-out, empty wishlist store.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            inner: Arc::new(WishlistInner {
                backend,
                state: Mutex::new(WishlistState::default()),
            }),
        }
    }

    /// Switch to a new identity (or to signed-out) and re-fetch.
    ///
    /// Local state is discarded immediately; the fetched set replaces it
    /// only if no newer identity change happened while the fetch was in
    /// flight.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Backend` when the fetch fails; the wishlist is
    /// left empty in that case.
    #[instrument(skip(self))]
    pub async fn set_identity(&self, identity: Option<UserId>) -> Result<()> {
        let (user, generation) = {
            let mut state = self.lock();
            state.generation += 1;
            state.entries.clear();
            state.identity.clone_from(&identity);
            match identity {
                None => {
                    state.loading = false;
                    return Ok(());
                }
                Some(user) => {
                    state.loading = true;
                    (user, state.generation)
                }
            }
        };

        let result = self.inner.backend.list_entries(&user).await;

        let mut state = self.lock();
        if state.generation != generation {
            debug!(user = %user, "Discarding wishlist fetch for superseded identity");
            return Ok(());
        }
        state.loading = false;

        match result {
            Ok(mut entries) => {
                entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));
                state.entries = entries;
                Ok(())
            }
            Err(e) => {
                drop(state);
                let err = AppError::Backend(e);
                report(&err);
                Err(err)
            }
        }
    }

    /// Add a product to the wishlist.
    ///
    /// Idempotent per product id: adding an already-saved product is a
    /// silent no-op. The local mirror is updated (newest first) only after
    /// the backend confirms the create.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotSignedIn` without touching the backend when no
    /// identity is set, and `AppError::Backend` when the remote create
    /// fails (local state unchanged).
    #[instrument(skip(self, entry), fields(product_id = %entry.product_id))]
    pub async fn add(&self, entry: NewWishlistEntry) -> Result<()> {
        let (user, generation) = {
            let state = self.lock();
            let Some(user) = state.identity.clone() else {
                return Err(AppError::NotSignedIn);
            };
            if state.entries.iter().any(|e| e.product_id == entry.product_id) {
                debug!("Product already in wishlist");
                return Ok(());
            }
            (user, state.generation)
        };

        match self.inner.backend.create_entry(&user, entry).await {
            Ok(created) => {
                let mut state = self.lock();
                // The identity may have changed while the create was in
                // flight; the document belongs to the old user then.
                if state.generation == generation
                    && !state.entries.iter().any(|e| e.product_id == created.product_id)
                {
                    state.entries.insert(0, created);
                }
                Ok(())
            }
            Err(e) => {
                let err = AppError::Backend(e);
                report(&err);
                Err(err)
            }
        }
    }

    /// Remove a product from the wishlist. No-op when not present.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotSignedIn` when no identity is set, and
    /// `AppError::Backend` when the remote delete fails (local state
    /// unchanged).
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<()> {
        let (entry_id, generation) = {
            let state = self.lock();
            if state.identity.is_none() {
                return Err(AppError::NotSignedIn);
            }
            let Some(entry) = state.entries.iter().find(|e| &e.product_id == product_id)
            else {
                return Ok(());
            };
            (entry.id.clone(), state.generation)
        };

        match self.inner.backend.delete_entry(&entry_id).await {
            Ok(()) => {
                let mut state = self.lock();
                if state.generation == generation {
                    state.entries.retain(|e| &e.product_id != product_id);
                }
                Ok(())
            }
            Err(e) => {
                let err = AppError::Backend(e);
                report(&err);
                Err(err)
            }
        }
    }

    /// Whether a product is currently in the wishlist.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.lock()
            .entries
            .iter()
            .any(|e| &e.product_id == product_id)
    }

    /// Number of wishlist entries.
    #[must_use]
    pub fn count(&self) -> usize {
        self.lock().entries.len()
    }

    /// Snapshot of the entries, newest first.
    #[must_use]
    pub fn entries(&self) -> Vec<WishlistEntry> {
        self.lock().entries.clone()
    }

    /// True while a fetch for the current identity is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    /// The current identity, if signed in.
    #[must_use]
    pub fn identity(&self) -> Option<UserId> {
        self.lock().identity.clone()
    }

    fn lock(&self) -> MutexGuard<'_, WishlistState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use showmyfit_core::WishlistEntryId;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn new_entry(product_id: &str) -> NewWishlistEntry {
        NewWishlistEntry {
            product_id: ProductId::new(product_id),
            name: format!("Product {product_id}"),
            price: Decimal::from(25),
            original_price: None,
            image_url: format!("https://images.showmyfit.com/{product_id}.jpg"),
            brand_name: "Acme".to_owned(),
            category: None,
            seller_id: None,
            seller_name: None,
        }
    }

    /// In-memory wishlist backend for tests.
    #[derive(Default)]
    struct FakeBackend {
        docs: Mutex<Vec<(UserId, WishlistEntry)>>,
        next_id: AtomicUsize,
        fail: AtomicBool,
        /// Delays list responses until released when set.
        gate: Option<tokio::sync::Semaphore>,
    }

    impl FakeBackend {
        fn failing(&self) -> bool {
            self.fail.load(Ordering::SeqCst)
        }
    }

    impl WishlistBackend for Arc<FakeBackend> {
        async fn list_entries(&self, user: &UserId) -> std::result::Result<Vec<WishlistEntry>, BackendError> {
            if let Some(gate) = &self.gate {
                let permit = gate.acquire().await.map_err(|_| BackendError::NotFound("gate".to_owned()))?;
                permit.forget();
            }
            if self.failing() {
                return Err(BackendError::Status { status: 500, message: "boom".to_owned() });
            }
            Ok(self
                .docs
                .lock()
                .unwrap()
                .iter()
                .filter(|(owner, _)| owner == user)
                .map(|(_, e)| e.clone())
                .collect())
        }

        async fn create_entry(
            &self,
            user: &UserId,
            entry: NewWishlistEntry,
        ) -> std::result::Result<WishlistEntry, BackendError> {
            if self.failing() {
                return Err(BackendError::Status { status: 500, message: "boom".to_owned() });
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let created = WishlistEntry {
                id: WishlistEntryId::new(format!("w{id}")),
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
            self.docs.lock().unwrap().push((user.clone(), created.clone()));
            Ok(created)
        }

        async fn delete_entry(&self, id: &WishlistEntryId) -> std::result::Result<(), BackendError> {
            if self.failing() {
                return Err(BackendError::Status { status: 500, message: "boom".to_owned() });
            }
            self.docs.lock().unwrap().retain(|(_, e)| &e.id != id);
            Ok(())
        }
    }

    fn fresh_store() -> (WishlistStore<Arc<FakeBackend>>, Arc<FakeBackend>) {
        let backend = Arc::new(FakeBackend::default());
        let store = WishlistStore::new(Arc::clone(&backend));
        (store, backend)
    }

    #[tokio::test]
    async fn test_add_requires_identity() {
        let (store, backend) = fresh_store();
        let err = store.add(new_entry("p1")).await.unwrap_err();
        assert!(matches!(err, AppError::NotSignedIn));
        // Short-circuited before any remote call.
        assert!(backend.docs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_is_idempotent_per_product() {
        let (store, backend) = fresh_store();
        store.set_identity(Some(UserId::new("u1"))).await.unwrap();

        store.add(new_entry("p1")).await.unwrap();
        store.add(new_entry("p1")).await.unwrap();

        assert_eq!(store.count(), 1);
        assert_eq!(backend.docs.lock().unwrap().len(), 1);
        assert!(store.contains(&ProductId::new("p1")));
    }

    #[tokio::test]
    async fn test_remove_absent_product_is_noop() {
        let (store, _) = fresh_store();
        store.set_identity(Some(UserId::new("u1"))).await.unwrap();

        store.remove(&ProductId::new("p9")).await.unwrap();
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_remove_deletes_remotely_then_locally() {
        let (store, backend) = fresh_store();
        store.set_identity(Some(UserId::new("u1"))).await.unwrap();
        store.add(new_entry("p1")).await.unwrap();

        store.remove(&ProductId::new("p1")).await.unwrap();
        assert_eq!(store.count(), 0);
        assert!(backend.docs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_leaves_local_state_unchanged() {
        let (store, backend) = fresh_store();
        store.set_identity(Some(UserId::new("u1"))).await.unwrap();
        store.add(new_entry("p1")).await.unwrap();

        backend.fail.store(true, Ordering::SeqCst);
        assert!(store.add(new_entry("p2")).await.is_err());
        assert!(store.remove(&ProductId::new("p1")).await.is_err());

        assert_eq!(store.count(), 1);
        assert!(store.contains(&ProductId::new("p1")));
    }

    #[tokio::test]
    async fn test_identity_change_refetches_newest_first() {
        let backend = Arc::new(FakeBackend::default());
        let now = Utc::now();
        {
            let mut docs = backend.docs.lock().unwrap();
            for (i, age_mins) in [(1, 30), (2, 10), (3, 20)] {
                let entry = WishlistEntry {
                    id: WishlistEntryId::new(format!("w{i}")),
                    product_id: ProductId::new(format!("p{i}")),
                    name: format!("Product p{i}"),
                    price: Decimal::from(10),
                    original_price: None,
                    image_url: String::new(),
                    brand_name: "Acme".to_owned(),
                    category: None,
                    seller_id: None,
                    seller_name: None,
                    added_at: now - Duration::minutes(age_mins),
                };
                docs.push((UserId::new("u1"), entry));
            }
        }

        let store = WishlistStore::new(Arc::clone(&backend));
        store.set_identity(Some(UserId::new("u1"))).await.unwrap();

        let entries = store.entries();
        let ids: Vec<&str> = entries.iter().map(|e| e.product_id.as_str()).collect();
        assert_eq!(ids, vec!["p2", "p3", "p1"]);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_sign_out_clears_state_without_fetching() {
        let (store, _) = fresh_store();
        store.set_identity(Some(UserId::new("u1"))).await.unwrap();
        store.add(new_entry("p1")).await.unwrap();

        store.set_identity(None).await.unwrap();
        assert_eq!(store.count(), 0);
        assert_eq!(store.identity(), None);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_stale_fetch_for_previous_identity_is_discarded() {
        // u1's fetch is gated; u2's completes first. When u1's response
        // finally arrives it must not clobber u2's wishlist.
        let backend = Arc::new(FakeBackend {
            gate: Some(tokio::sync::Semaphore::new(0)),
            ..FakeBackend::default()
        });
        {
            let mut docs = backend.docs.lock().unwrap();
            docs.push((
                UserId::new("u1"),
                WishlistEntry {
                    id: WishlistEntryId::new("w1"),
                    product_id: ProductId::new("old-users-item"),
                    name: "Old".to_owned(),
                    price: Decimal::from(5),
                    original_price: None,
                    image_url: String::new(),
                    brand_name: "Acme".to_owned(),
                    category: None,
                    seller_id: None,
                    seller_name: None,
                    added_at: Utc::now(),
                },
            ));
        }

        let store = WishlistStore::new(Arc::clone(&backend));

        let slow = {
            let store = store.clone();
            tokio::spawn(async move { store.set_identity(Some(UserId::new("u1"))).await })
        };
        // Let the slow fetch reach the gate before switching identity.
        tokio::task::yield_now().await;

        // Switch to u2; release two permits so both fetches can finish.
        backend.gate.as_ref().unwrap().add_permits(2);
        store.set_identity(Some(UserId::new("u2"))).await.unwrap();
        slow.await.unwrap().unwrap();

        assert_eq!(store.identity(), Some(UserId::new("u2")));
        assert_eq!(store.count(), 0);
        assert!(!store.contains(&ProductId::new("old-users-item")));
    }
}
