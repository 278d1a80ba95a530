//! Local-storage cache for derived image URLs.
//!
//! Keys live under a versioned namespace so a format change invalidates old
//! entries wholesale by bumping the version token. Entries expire lazily:
//! expiry is checked on read, never by a background timer.
//!
//! This cache is best-effort. A full store triggers one recovery attempt
//! (evict the whole namespace, retry the write once) and then gives up
//! silently; an unusable store degrades to an always-miss cache.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::storage::{KeyValueStorage, StorageError};

/// Versioned key prefix. Bump the `v1` token to invalidate every entry.
pub const CACHE_NAMESPACE: &str = "smf:img:v1:";

/// Default entry lifetime.
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A cached derived URL with its expiry instant.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    url: String,
    expires_at: i64,
}

/// Cache mapping (source URL, width, height) to a derived URL.
#[derive(Debug, Clone)]
pub struct ImageUrlCache<S, C> {
    storage: S,
    clock: C,
    ttl: Duration,
}

impl<S: KeyValueStorage, C: Clock> ImageUrlCache<S, C> {
    /// Create a cache with the default 24-hour TTL.
    #[must_use]
    pub fn new(storage: S, clock: C) -> Self {
        Self::with_ttl(storage, clock, DEFAULT_TTL)
    }

    /// Create a cache with a custom TTL.
    #[must_use]
    pub const fn with_ttl(storage: S, clock: C, ttl: Duration) -> Self {
        Self { storage, clock, ttl }
    }

    /// Look up a derived URL.
    ///
    /// Expired and malformed entries are evicted on read and reported as a
    /// miss; a second `get` will not resurrect them.
    pub fn get(&self, source_url: &str, width: Option<u32>, height: Option<u32>) -> Option<String> {
        let key = cache_key(source_url, width, height);
        let raw = self.storage.get(&key)?;

        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) if self.clock.now_millis() < entry.expires_at => {
                debug!(key = %key, "Image URL cache hit");
                Some(entry.url)
            }
            Ok(_) => {
                debug!(key = %key, "Evicting expired image URL");
                self.storage.remove(&key);
                None
            }
            Err(e) => {
                debug!(key = %key, error = %e, "Evicting malformed cache entry");
                self.storage.remove(&key);
                None
            }
        }
    }

    /// Store a derived URL, overwriting any existing entry for the key.
    ///
    /// Failures never surface to the caller: this is a cache, not a
    /// durability guarantee.
    pub fn set(
        &self,
        source_url: &str,
        derived_url: &str,
        width: Option<u32>,
        height: Option<u32>,
    ) {
        let key = cache_key(source_url, width, height);
        let entry = CacheEntry {
            url: derived_url.to_owned(),
            expires_at: self.clock.now_millis() + ttl_millis(self.ttl),
        };
        let Ok(json) = serde_json::to_string(&entry) else {
            return;
        };

        match self.storage.set(&key, &json) {
            Ok(()) => {}
            Err(StorageError::QuotaExceeded) => self.recover_from_quota(&key, &json),
            Err(e) => {
                debug!(error = %e, "Image URL cache write dropped");
            }
        }
    }

    /// Quota recovery policy: evict the entire namespace, retry the write
    /// once, and drop it silently if the retry also fails.
    fn recover_from_quota(&self, key: &str, json: &str) {
        warn!("Image URL cache hit storage quota, evicting namespace");
        self.evict_all();
        if let Err(e) = self.storage.set(key, json) {
            debug!(error = %e, "Image URL cache write dropped after quota recovery");
        }
    }

    /// Remove every entry under this cache's namespace.
    ///
    /// Entries from other namespace versions are untouched.
    pub fn evict_all(&self) {
        for key in self.storage.keys_with_prefix(CACHE_NAMESPACE) {
            self.storage.remove(&key);
        }
    }
}

/// Composite key: versioned prefix + source URL + dimensions.
///
/// An absent dimension is keyed as `0`, so (url, 640, None) and
/// (url, 640, 480) are distinct entries.
fn cache_key(source_url: &str, width: Option<u32>, height: Option<u32>) -> String {
    format!(
        "{CACHE_NAMESPACE}{source_url}|{}x{}",
        width.unwrap_or(0),
        height.unwrap_or(0)
    )
}

#[allow(clippy::cast_possible_truncation)]
const fn ttl_millis(ttl: Duration) -> i64 {
    ttl.as_millis() as i64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStorage;

    const URL: &str = "https://images.showmyfit.com/p1.jpg";
    const DERIVED: &str = "https://images.showmyfit.com/p1.jpg?w=640&format=webp";

    fn cache_at(millis: i64) -> (ImageUrlCache<MemoryStorage, ManualClock>, ManualClock) {
        let clock = ManualClock::at(millis);
        let cache = ImageUrlCache::new(MemoryStorage::new(), clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_round_trip() {
        let (cache, _clock) = cache_at(1_000);
        cache.set(URL, DERIVED, Some(640), None);
        assert_eq!(cache.get(URL, Some(640), None).as_deref(), Some(DERIVED));
    }

    #[test]
    fn test_dimensions_are_part_of_the_key() {
        let (cache, _clock) = cache_at(1_000);
        cache.set(URL, DERIVED, Some(640), None);
        assert_eq!(cache.get(URL, Some(640), Some(480)), None);
        assert_eq!(cache.get(URL, None, None), None);
    }

    #[test]
    fn test_expired_entry_is_evicted_and_stays_gone() {
        let (cache, clock) = cache_at(0);
        cache.set(URL, DERIVED, None, None);
        clock.advance(24 * 60 * 60 * 1_000 + 1);
        assert_eq!(cache.get(URL, None, None), None);
        // Move the clock back: the entry must not resurrect after eviction.
        clock.advance(-(24 * 60 * 60 * 1_000));
        assert_eq!(cache.get(URL, None, None), None);
    }

    #[test]
    fn test_malformed_entry_is_evicted() {
        let storage = MemoryStorage::new();
        let key = cache_key(URL, None, None);
        storage.set(&key, "not-json").unwrap();

        let cache = ImageUrlCache::new(storage.clone(), ManualClock::at(0));
        assert_eq!(cache.get(URL, None, None), None);
        assert_eq!(storage.get(&key), None);
    }

    #[test]
    fn test_set_overwrites_with_fresh_expiry() {
        let (cache, clock) = cache_at(0);
        cache.set(URL, "stale", None, None);
        clock.advance(23 * 60 * 60 * 1_000);
        cache.set(URL, DERIVED, None, None);
        // Two more hours: past the first expiry, within the second.
        clock.advance(2 * 60 * 60 * 1_000);
        assert_eq!(cache.get(URL, None, None).as_deref(), Some(DERIVED));
    }

    #[test]
    fn test_quota_recovery_evicts_namespace_and_retries() {
        // Quota fits roughly one entry; the second write must evict the
        // first and then succeed.
        let storage = MemoryStorage::with_quota(220);
        let cache = ImageUrlCache::new(storage.clone(), ManualClock::at(0));

        cache.set("https://a.example/1.jpg", DERIVED, None, None);
        assert!(cache.get("https://a.example/1.jpg", None, None).is_some());

        cache.set("https://a.example/2.jpg", DERIVED, None, None);
        assert_eq!(cache.get("https://a.example/1.jpg", None, None), None);
        assert_eq!(
            cache.get("https://a.example/2.jpg", None, None).as_deref(),
            Some(DERIVED)
        );
    }

    #[test]
    fn test_hopeless_quota_drops_write_silently() {
        let storage = MemoryStorage::with_quota(10);
        let cache = ImageUrlCache::new(storage, ManualClock::at(0));
        // Must not panic or error; the cache just stays empty.
        cache.set(URL, DERIVED, None, None);
        assert_eq!(cache.get(URL, None, None), None);
    }

    #[test]
    fn test_evict_all_leaves_other_namespaces_alone() {
        let storage = MemoryStorage::new();
        storage.set("cart", "[]").unwrap();
        let cache = ImageUrlCache::new(storage.clone(), ManualClock::at(0));
        cache.set(URL, DERIVED, None, None);

        cache.evict_all();
        assert_eq!(cache.get(URL, None, None), None);
        assert_eq!(storage.get("cart").as_deref(), Some("[]"));
    }
}
