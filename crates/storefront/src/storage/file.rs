//! File-backed key-value storage.
//!
//! One JSON object in one file; every mutation rewrites the file through a
//! temp-file rename so a crash mid-write cannot leave a half-written map.
//! This is the desktop analog of browser local storage: small data, whole
//! collection serialized per mutation.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::warn;

use super::{KeyValueStorage, StorageError};

/// File-backed storage, cheaply cloneable (clones share the same map and file).
#[derive(Debug, Clone)]
pub struct FileStorage {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    map: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    /// Open storage at `path`, loading any existing contents.
    ///
    /// A missing file starts empty. A corrupt file is logged and treated as
    /// empty rather than failing the caller.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let map = Self::load(&path);
        Self {
            inner: Arc::new(Inner {
                path,
                map: Mutex::new(map),
            }),
        }
    }

    fn load(path: &Path) -> HashMap<String, String> {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Corrupt storage file, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable storage file, starting empty");
                HashMap::new()
            }
        }
    }

    fn flush(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_string(map).map_err(|e| {
            StorageError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        let tmp = self.inner.path.with_extension("tmp");
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.inner.path)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner
            .map
            .lock()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self
            .inner
            .map
            .lock()
            .map_err(|_| StorageError::Unavailable)?;
        let previous = map.insert(key.to_owned(), value.to_owned());

        if let Err(e) = self.flush(&map) {
            // Keep map and file consistent: roll back the in-memory write.
            match previous {
                Some(v) => {
                    map.insert(key.to_owned(), v);
                }
                None => {
                    map.remove(key);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) {
        if let Ok(mut map) = self.inner.map.lock() {
            if map.remove(key).is_some()
                && let Err(e) = self.flush(&map)
            {
                warn!(error = %e, "Failed to persist removal");
            }
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.inner.map.lock().map_or_else(
            |_| Vec::new(),
            |map| {
                map.keys()
                    .filter(|k| k.starts_with(prefix))
                    .cloned()
                    .collect()
            },
        )
    }
}
