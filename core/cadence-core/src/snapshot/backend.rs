//! Raw key/value storage for snapshots.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use fs_err as fs;
use tempfile::NamedTempFile;

use crate::storage::StorageConfig;

/// Keyed string storage. Keys are routine ids.
///
/// A missing key reads as `Ok(None)` and removes as `Ok(())`.
pub trait SnapshotBackend: Send + Sync {
    fn read(&self, key: &str) -> io::Result<Option<String>>;
    fn write(&self, key: &str, payload: &str) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// File backend
// ─────────────────────────────────────────────────────────────────────────────

/// One JSON file per routine under `snapshots/`.
///
/// Writes go to a temp file in the same directory and are renamed into place,
/// so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileSnapshotBackend {
    storage: StorageConfig,
}

impl FileSnapshotBackend {
    pub fn new(storage: StorageConfig) -> Self {
        Self { storage }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.storage.snapshot_file(key)
    }
}

impl SnapshotBackend for FileSnapshotBackend {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&self, key: &str, payload: &str) -> io::Result<()> {
        let dir = self.storage.snapshots_dir();
        fs::create_dir_all(&dir)?;

        let mut temp_file = NamedTempFile::new_in(&dir)?;
        temp_file.write_all(payload.as_bytes())?;
        temp_file.flush()?;
        temp_file
            .persist(self.path_for(key))
            .map_err(|err| err.error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory backend
// ─────────────────────────────────────────────────────────────────────────────

/// Map-backed storage for tests and hosts without a writable disk.
///
/// Clones share contents. `set_failing(true)` makes every call error, which
/// stands in for a full or disabled storage area.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotBackend {
    entries: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<AtomicBool>,
}

impl MemorySnapshotBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Raw stored payload, bypassing the failure switch.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Stores a payload verbatim (e.g. a corrupted or foreign snapshot).
    pub fn insert_raw(&self, key: &str, payload: &str) {
        self.lock().insert(key.to_string(), payload.to_string());
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self) -> io::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(io::Error::new(io::ErrorKind::Other, "snapshot storage unavailable"))
        } else {
            Ok(())
        }
    }
}

impl SnapshotBackend for MemorySnapshotBackend {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        self.check()?;
        Ok(self.lock().get(key).cloned())
    }

    fn write(&self, key: &str, payload: &str) -> io::Result<()> {
        self.check()?;
        self.lock().insert(key.to_string(), payload.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.check()?;
        self.lock().remove(key);
        Ok(())
    }
}
