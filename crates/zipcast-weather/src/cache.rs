//! Time-limited memoization of remote weather lookups.
//!
//! One [`WeatherCache`] exists per kind of payload. Stale entries are only
//! dropped when the cache is next consulted; nothing runs in the background.

use crate::clock::Clock;
use crate::store::SnapshotWriter;
use crate::types::{LocationCode, WeatherError};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// A cached payload and the instant it stops being served
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub key: LocationCode,
    pub payload: T,
    pub expires_at: DateTime<Utc>,
}

/// Called with the key and error whenever a fetch fails
pub type FailureListener = Box<dyn Fn(&LocationCode, WeatherError) + Send + Sync>;

pub struct WeatherCache<T> {
    label: &'static str,
    entries: HashMap<LocationCode, CacheEntry<T>>,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
    writer: Option<SnapshotWriter>,
    on_failure: Option<FailureListener>,
}

impl<T> WeatherCache<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    /// In-memory cache. `label` only shows up in logs.
    pub fn new(label: &'static str, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            label,
            entries: HashMap::new(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            clock,
            writer: None,
            on_failure: None,
        }
    }

    /// Cache rehydrated from, and written back to, the writer's key
    pub fn persistent(writer: SnapshotWriter, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let mut cache = Self::new(writer.key(), ttl, clock);

        if let Some(snapshot) = writer.read::<Vec<CacheEntry<T>>>() {
            for entry in snapshot {
                cache.entries.insert(entry.key.clone(), entry);
            }
            tracing::debug!(
                "Restored {} {} entries from snapshot",
                cache.entries.len(),
                cache.label
            );
        }

        cache.writer = Some(writer);
        cache
    }

    pub fn with_failure_listener(
        mut self,
        listener: impl Fn(&LocationCode, WeatherError) + Send + Sync + 'static,
    ) -> Self {
        self.on_failure = Some(Box::new(listener));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look at an entry without evicting anything
    pub fn peek(&self, key: &LocationCode) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    /// Drop every entry whose expiry is not after now. Returns how many were dropped.
    ///
    /// An entry is stale from the instant `expires_at` is reached, so a lookup
    /// exactly one TTL after the fetch goes back to the provider. Keeping
    /// entries until `expires_at < now` would serve that lookup from cache.
    pub fn evict_expired(&mut self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);

        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::debug!("Evicted {} stale {} entries", evicted, self.label);
            self.persist();
        }
        evicted
    }

    /// Serve `key` from the cache, or run `fetch` and remember its result.
    ///
    /// A failed fetch stores nothing, returns `None` and is handed to the
    /// failure listener. Identical concurrent misses are not coalesced.
    pub async fn resolve<F, Fut>(&mut self, key: &LocationCode, fetch: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, WeatherError>>,
    {
        self.evict_expired();

        if let Some(entry) = self.entries.get(key) {
            tracing::debug!("{} cache hit for {}", self.label, key);
            return Some(entry.payload.clone());
        }

        tracing::debug!("{} cache miss for {}", self.label, key);
        match fetch().await {
            Ok(payload) => {
                let expires_at = self
                    .clock
                    .now()
                    .checked_add_signed(self.ttl)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                self.entries.insert(
                    key.clone(),
                    CacheEntry {
                        key: key.clone(),
                        payload: payload.clone(),
                        expires_at,
                    },
                );
                self.persist();
                Some(payload)
            }
            Err(e) => {
                tracing::warn!("No {} available for {}: {}", self.label, key, e);
                if let Some(listener) = &self.on_failure {
                    listener(key, e);
                }
                None
            }
        }
    }

    fn persist(&self) {
        if let Some(writer) = &self.writer {
            let mut snapshot: Vec<&CacheEntry<T>> = self.entries.values().collect();
            snapshot.sort_by(|a, b| a.key.cmp(&b.key));
            writer.write(&snapshot);
        }
    }
}
