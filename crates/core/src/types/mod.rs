//! Core types for ShowMyFit.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;
pub mod wishlist;

pub use cart::{CartLine, RecentlyAdded};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use product::{ProductStatus, ProductSummary};
pub use wishlist::{NewWishlistEntry, WishlistEntry};
