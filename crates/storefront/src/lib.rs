//! ShowMyFit Storefront - client-state library.
//!
//! This crate holds everything in ShowMyFit that has behavior of its own:
//! the cart and wishlist stores, the optimized-image URL cache and resolver,
//! and product search suggestions. View composition and the hosted backend
//! (document database, auth provider) are external collaborators; this
//! library is what sits between them.
//!
//! # Architecture
//!
//! - Stores are explicit objects handed to whatever needs them - no ambient
//!   singletons. [`state::Storefront`] wires them up from configuration.
//! - Local persistence goes through the [`storage::KeyValueStorage`] adapter
//!   (a file-backed map in production, in-memory in tests).
//! - Remote calls go through the [`backend`] traits so stores can be tested
//!   against an in-memory fake.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod images;
pub mod search;
pub mod state;
pub mod storage;
pub mod stores;
pub mod telemetry;
