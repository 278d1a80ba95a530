//! Client-side state stores.
//!
//! Each store is an explicit, cheaply-cloneable handle (shared state behind
//! `Arc`) that callers thread through their component tree - no ambient
//! globals. The cart persists locally through the storage adapter; the
//! wishlist is backed by the hosted document API.

mod cart;
mod wishlist;

pub use cart::{CartItemInput, CartStore};
pub use wishlist::WishlistStore;
