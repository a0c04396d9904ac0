use core::time::Duration;
use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::store::{CoordinationStore, StoreResult};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// An in-process [`CoordinationStore`] with TTL expiry.
///
/// Clones share the same keyspace, so several generators in one process can
/// contend on it exactly like separate nodes would on a networked store.
/// Expiry is measured with [`tokio::time::Instant`], which means paused-time
/// tests can fast-forward leases deterministically.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remaining time-to-live of `key`, if it is live.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .lock()
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.expires_at - now)
    }

    fn live_value(map: &mut HashMap<String, Entry>, key: &str, now: Instant) -> Option<String> {
        match map.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                map.remove(key);
                None
            }
            None => None,
        }
    }
}

impl CoordinationStore for MemoryStore {
    async fn create_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        let now = Instant::now();
        let mut map = self.entries.lock();
        if Self::live_value(&mut map, key, now).is_some() {
            return Ok(false);
        }
        map.insert(
            key.to_owned(),
            Entry {
                value: value.to_owned(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = Instant::now();
        Ok(Self::live_value(&mut self.entries.lock(), key, now))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn refresh_ttl(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        let now = Instant::now();
        let mut map = self.entries.lock();
        if Self::live_value(&mut map, key, now).is_none() {
            return Ok(false);
        }
        if let Some(entry) = map.get_mut(key) {
            entry.expires_at = now + ttl;
        }
        Ok(true)
    }

    async fn batch_get(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        let now = Instant::now();
        let mut map = self.entries.lock();
        Ok(keys
            .iter()
            .map(|key| Self::live_value(&mut map, key, now))
            .collect())
    }
}
