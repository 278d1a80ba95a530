//! Local key-value persistence.
//!
//! The original client kept cart state and the image-URL cache in browser
//! local storage. This module is the explicit stand-in: a small string
//! key-value adapter with `load`-on-open and `save`-on-mutation semantics,
//! decoupled from any UI lifecycle.
//!
//! Callers must tolerate a degraded adapter: an unavailable store behaves
//! as always-empty, and quota failures are recoverable errors, not panics.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Errors from the key-value adapter.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The value could not be written because the store is full.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// The store cannot be used at all (e.g., persistence disabled).
    #[error("storage unavailable")]
    Unavailable,

    /// Underlying I/O failure while persisting.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A string key-value store.
///
/// Writes are synchronous and atomic per key from the caller's perspective.
/// `get` never fails: any read problem is reported as an absent value, which
/// matches the "degrade to a smaller, still-usable state" policy.
pub trait KeyValueStorage: Send + Sync + 'static {
    /// Read a value. Absent and unreadable are indistinguishable on purpose.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, overwriting any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::QuotaExceeded`] when the store is full and
    /// [`StorageError::Io`]/[`StorageError::Unavailable`] for other failures.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. No-op when absent.
    fn remove(&self, key: &str);

    /// All keys starting with `prefix`, in unspecified order.
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;
}
