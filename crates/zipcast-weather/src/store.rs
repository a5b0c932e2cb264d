//! Durable key-value storage for snapshots of locations and cached weather.

use crate::types::StoreError;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Key holding the ordered list of tracked location codes
pub const LOCATIONS_KEY: &str = "locations";
/// Key holding the current-conditions cache snapshot
pub const CONDITIONS_KEY: &str = "conditions";
/// Key holding the forecast cache snapshot
pub const FORECAST_KEY: &str = "forecast";

/// String key-value store shared by the registry and both caches
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One JSON file per key inside a data directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// In-process store, used when nothing should touch the disk
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    writes: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls received so far
    pub fn write_count(&self) -> usize {
        *self.writes.lock()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        *self.writes.lock() += 1;
        Ok(())
    }
}

/// Called with every failed write and every unreadable snapshot
pub type StoreErrorListener = Arc<dyn Fn(StoreError) + Send + Sync>;

/// Writes a component's snapshot under its fixed key after every mutation.
///
/// Failures are logged and handed to the error listener, never returned to
/// the mutating component. Nothing is retried.
#[derive(Clone)]
pub struct SnapshotWriter {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    on_error: Option<StoreErrorListener>,
}

impl SnapshotWriter {
    pub fn new(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            on_error: None,
        }
    }

    pub fn with_error_listener(
        mut self,
        listener: impl Fn(StoreError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(listener));
        self
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn write<S: Serialize + ?Sized>(&self, snapshot: &S) {
        if let Err(e) = self.try_write(snapshot) {
            tracing::warn!("Failed to persist {} snapshot: {}", self.key, e);
            self.report(e);
        }
    }

    /// Read the last snapshot. Missing or corrupt data yields `None`.
    pub fn read<D: DeserializeOwned>(&self) -> Option<D> {
        let raw = self.store.get(self.key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(source) => {
                tracing::warn!("Ignoring corrupt {} snapshot: {}", self.key, source);
                self.report(StoreError::Corrupt {
                    key: self.key,
                    source,
                });
                None
            }
        }
    }

    fn try_write<S: Serialize + ?Sized>(&self, snapshot: &S) -> Result<(), StoreError> {
        let json = serde_json::to_string(snapshot)?;
        self.store.set(self.key, &json)
    }

    fn report(&self, err: StoreError) {
        if let Some(listener) = &self.on_error {
            listener(err);
        }
    }
}

impl std::fmt::Debug for SnapshotWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotWriter").field("key", &self.key).finish()
    }
}
