//! ShowMyFit Core - Shared types library.
//!
//! This crate provides common types used across all ShowMyFit components:
//! - `storefront` - Client-state library (cart, wishlist, image cache, search)
//! - `integration-tests` - Cross-store scenario tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices, plus the
//!   product, cart, and wishlist data model

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
