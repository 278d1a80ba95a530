//! Cart store.
//!
//! An event-driven reducer over one ordered collection of line items, plus a
//! bounded ring of recent add events. Every mutation is written through the
//! storage adapter under the `cart` and `lastAddedProducts` keys; state is
//! loaded once at construction. Persistence is best-effort: a failed write
//! is logged and the in-memory state stays authoritative.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{instrument, warn};

use showmyfit_core::{CartLine, ProductId, RecentlyAdded, SellerId};

use crate::clock::Clock;
use crate::storage::KeyValueStorage;

/// Storage key for the cart collection.
const CART_KEY: &str = "cart";
/// Storage key for the recently-added ring.
const RECENT_KEY: &str = "lastAddedProducts";
/// Maximum recently-added entries kept (newest first).
const RECENT_LIMIT: usize = 5;
/// How long `just_added` stays set after an add.
const JUST_ADDED_WINDOW_MS: i64 = 3_000;
/// How long `is_adding` stays set after an add.
const ADDING_WINDOW_MS: i64 = 500;

/// Product data for an add-to-cart call. Quantity is implicit: a repeated
/// id increments the existing line instead of duplicating it.
#[derive(Debug, Clone)]
pub struct CartItemInput {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub original_unit_price: Option<Decimal>,
    pub image_url: String,
    pub brand_name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub seller_id: Option<SellerId>,
    pub seller_name: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default)]
struct CartState {
    lines: Vec<CartLine>,
    recent: Vec<RecentlyAdded>,
    just_added_until: i64,
    adding_until: i64,
}

/// Cart store handle.
///
/// Cheaply cloneable; clones share the same state and storage.
#[derive(Clone)]
pub struct CartStore<S, C> {
    inner: Arc<CartInner<S, C>>,
}

struct CartInner<S, C> {
    storage: S,
    clock: C,
    state: Mutex<CartState>,
}

impl<S: KeyValueStorage, C: Clock> CartStore<S, C> {
    /// Create a cart store, loading any persisted state.
    ///
    /// Malformed persisted JSON is logged and treated as an empty cart
    /// rather than failing construction.
    #[must_use]
    pub fn new(storage: S, clock: C) -> Self {
        let lines = load_or_empty(&storage, CART_KEY);
        let recent = load_or_empty(&storage, RECENT_KEY);
        Self {
            inner: Arc::new(CartInner {
                storage,
                clock,
                state: Mutex::new(CartState {
                    lines,
                    recent,
                    just_added_until: 0,
                    adding_until: 0,
                }),
            }),
        }
    }

    /// Add a product to the cart.
    ///
    /// If the product is already present its quantity goes up by one;
    /// otherwise a new line is inserted at quantity 1. Either way a
    /// recently-added record is pushed and the feedback windows reset.
    #[instrument(skip(self, item), fields(product_id = %item.id))]
    pub fn add(&self, item: CartItemInput) {
        let mut state = self.lock();
        let now_ms = self.inner.clock.now_millis();
        let added_at = to_datetime(now_ms);

        let quantity = match state.lines.iter_mut().find(|line| line.id == item.id) {
            Some(line) => {
                line.quantity += 1;
                line.quantity
            }
            None => {
                state.lines.push(CartLine {
                    id: item.id.clone(),
                    name: item.name.clone(),
                    unit_price: item.unit_price,
                    original_unit_price: item.original_unit_price,
                    image_url: item.image_url.clone(),
                    brand_name: item.brand_name,
                    quantity: 1,
                    size: item.size,
                    color: item.color,
                    seller_id: item.seller_id,
                    seller_name: item.seller_name,
                    category: item.category,
                    added_at,
                });
                1
            }
        };

        state.recent.insert(
            0,
            RecentlyAdded {
                id: item.id,
                name: item.name,
                price: item.unit_price,
                image_url: item.image_url,
                added_at,
                quantity,
            },
        );
        state.recent.truncate(RECENT_LIMIT);

        // Each add resets both feedback windows.
        state.just_added_until = now_ms + JUST_ADDED_WINDOW_MS;
        state.adding_until = now_ms + ADDING_WINDOW_MS;

        self.persist(&state);
    }

    /// Remove a line by product id. No-op when absent.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn remove(&self, id: &ProductId) {
        let mut state = self.lock();
        let before = state.lines.len();
        state.lines.retain(|line| &line.id != id);
        if state.lines.len() != before {
            self.persist(&state);
        }
    }

    /// Set a line's quantity. A quantity below 1 removes the line.
    /// No-op when the id is absent.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn update_quantity(&self, id: &ProductId, quantity: u32) {
        if quantity < 1 {
            self.remove(id);
            return;
        }
        let mut state = self.lock();
        if let Some(line) = state.lines.iter_mut().find(|line| &line.id == id) {
            line.quantity = quantity;
            self.persist(&state);
        }
    }

    /// Empty the cart.
    #[instrument(skip(self))]
    pub fn clear(&self) {
        let mut state = self.lock();
        state.lines.clear();
        self.persist(&state);
    }

    /// Sum of unit price times quantity over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lock().lines.iter().map(CartLine::subtotal).sum()
    }

    /// Quantity-weighted item count (not the number of lines).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lock().lines.iter().map(|line| line.quantity).sum()
    }

    /// Snapshot of the cart lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lock().lines.clone()
    }

    /// Snapshot of the recently-added ring, newest first.
    #[must_use]
    pub fn recently_added(&self) -> Vec<RecentlyAdded> {
        self.lock().recent.clone()
    }

    /// True within 3 seconds of the most recent add.
    #[must_use]
    pub fn just_added(&self) -> bool {
        self.inner.clock.now_millis() < self.lock().just_added_until
    }

    /// True within 500 ms of the most recent add (drives button feedback).
    #[must_use]
    pub fn is_adding(&self) -> bool {
        self.inner.clock.now_millis() < self.lock().adding_until
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CartState> {
        // A poisoned lock means another handle panicked mid-mutation; the
        // cart data is still plain values, so keep serving it.
        self.inner
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn persist(&self, state: &CartState) {
        save_best_effort(&self.inner.storage, CART_KEY, &state.lines);
        save_best_effort(&self.inner.storage, RECENT_KEY, &state.recent);
    }
}

fn load_or_empty<T: serde::de::DeserializeOwned>(
    storage: &impl KeyValueStorage,
    key: &str,
) -> Vec<T> {
    let Some(raw) = storage.get(key) else {
        return Vec::new();
    };
    match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(e) => {
            warn!(key, error = %e, "Malformed persisted state, starting empty");
            Vec::new()
        }
    }
}

fn save_best_effort<T: serde::Serialize>(storage: &impl KeyValueStorage, key: &str, value: &T) {
    let Ok(json) = serde_json::to_string(value) else {
        return;
    };
    if let Err(e) = storage.set(key, &json) {
        warn!(key, error = %e, "Failed to persist cart state");
    }
}

fn to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
