//! Image URL resolver.
//!
//! `optimize_url` derives a size- and format-qualified URL from a source
//! URL using host-specific rules; URLs with no rule pass through unchanged.
//! The resolver wraps the transform with the local cache: hits return
//! immediately and optionally refresh in the background, misses compute
//! inline and store the result.

use tracing::{debug, instrument};
use url::Url;

use crate::clock::Clock;
use crate::images::cache::ImageUrlCache;
use crate::storage::KeyValueStorage;

/// Resolves optimized image URLs through the local cache.
#[derive(Debug, Clone)]
pub struct ImageResolver<S, C> {
    cache: ImageUrlCache<S, C>,
}

impl<S, C> ImageResolver<S, C>
where
    S: KeyValueStorage + Clone,
    C: Clock + Clone,
{
    /// Create a resolver over the given cache.
    #[must_use]
    pub const fn new(cache: ImageUrlCache<S, C>) -> Self {
        Self { cache }
    }

    /// Resolve an optimized URL for `source_url`.
    ///
    /// Returns the cached value when present; otherwise derives, stores,
    /// and returns the fresh value. Never fails: a URL with no transform
    /// rule resolves to itself.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        source_url: &str,
        width: Option<u32>,
        height: Option<u32>,
    ) -> String {
        if let Some(cached) = self.cache.get(source_url, width, height) {
            return cached;
        }

        let derived = optimize_url(source_url, width, height);
        self.cache.set(source_url, &derived, width, height);
        derived
    }

    /// Resolve with stale-while-revalidate.
    ///
    /// On a cache hit the cached value is returned immediately and a
    /// background task recomputes the derived URL; if the fresh value
    /// differs, the cache is updated and `on_refresh` is invoked exactly
    /// once with it. On a miss this behaves like [`resolve`](Self::resolve)
    /// and the callback is never invoked.
    ///
    /// Concurrent resolutions for the same key are not deduplicated: the
    /// transform is deterministic, so racing computations write identical
    /// values and last-write-wins is indistinguishable from first-write-wins.
    #[instrument(skip(self, on_refresh))]
    pub async fn resolve_with_refresh<F>(
        &self,
        source_url: &str,
        width: Option<u32>,
        height: Option<u32>,
        on_refresh: F,
    ) -> String
    where
        F: FnOnce(String) + Send + 'static,
    {
        let Some(cached) = self.cache.get(source_url, width, height) else {
            let derived = optimize_url(source_url, width, height);
            self.cache.set(source_url, &derived, width, height);
            return derived;
        };

        let cache = self.cache.clone();
        let source = source_url.to_owned();
        let stale = cached.clone();
        tokio::spawn(async move {
            let fresh = optimize_url(&source, width, height);
            if fresh != stale {
                debug!(source = %source, "Refreshing cached image URL");
                cache.set(&source, &fresh, width, height);
                on_refresh(fresh);
            }
        });

        cached
    }
}

/// Derive an optimized URL from a source URL.
///
/// Recognized hosting patterns get query-parameter transforms; data, blob,
/// relative, and unrecognized URLs pass through unchanged. This transform
/// never fails.
#[must_use]
pub fn optimize_url(source_url: &str, width: Option<u32>, height: Option<u32>) -> String {
    if source_url.starts_with("data:") || source_url.starts_with("blob:") {
        return source_url.to_owned();
    }

    // Relative and local paths don't parse as absolute URLs; pass through.
    let Ok(mut url) = Url::parse(source_url) else {
        return source_url.to_owned();
    };
    if !matches!(url.scheme(), "http" | "https") {
        return source_url.to_owned();
    }
    let Some(host) = url.host_str().map(str::to_owned) else {
        return source_url.to_owned();
    };

    if host == "images.unsplash.com" {
        let mut params = vec![
            ("auto".to_owned(), "format".to_owned()),
            ("fit".to_owned(), "crop".to_owned()),
            ("q".to_owned(), "80".to_owned()),
        ];
        if let Some(w) = width {
            params.push(("w".to_owned(), w.to_string()));
        }
        if let Some(h) = height {
            params.push(("h".to_owned(), h.to_string()));
        }
        replace_params(&mut url, &["auto", "fit", "q", "w", "h"], params);
        return url.into();
    }

    if host == "images.showmyfit.com" || host.ends_with(".showmyfit.app") {
        let mut params = vec![
            ("format".to_owned(), "webp".to_owned()),
            ("q".to_owned(), "80".to_owned()),
        ];
        if let Some(w) = width {
            params.push(("w".to_owned(), w.to_string()));
        }
        if let Some(h) = height {
            params.push(("h".to_owned(), h.to_string()));
        }
        replace_params(&mut url, &["format", "q", "w", "h"], params);
        return url.into();
    }

    // No rule for this host: passthrough, not an error.
    source_url.to_owned()
}

/// Replace the managed query parameters on `url`, keeping foreign ones.
///
/// Keeps the transform idempotent: optimizing an already-optimized URL
/// yields the same string.
fn replace_params(url: &mut Url, managed: &[&str], params: Vec<(String, String)>) {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !managed.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.set_query(None);
    let mut pairs = url.query_pairs_mut();
    for (k, v) in kept.into_iter().chain(params) {
        pairs.append_pair(&k, &v);
    }
    drop(pairs);
}
