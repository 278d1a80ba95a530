//! Optimized image URL derivation and caching.
//!
//! Deriving an optimized URL is a pure string transform, but product grids
//! resolve hundreds of images, so derived URLs are cached in local storage
//! with a TTL. The resolver serves cached values immediately and refreshes
//! them in the background (stale-while-revalidate).

mod cache;
mod resolver;

pub use cache::{CACHE_NAMESPACE, ImageUrlCache};
pub use resolver::{ImageResolver, optimize_url};
