//! Bounded-TTL cache for geocoder results.
//!
//! Nominatim enforces informal rate limits, so successful geocoder results
//! are worth keeping for a while. The cache is an explicitly constructed
//! object injected into the resolver — no module-level singletons. Entries
//! are keyed by the exact query string. Concurrent lookups may race on
//! writes; entries are idempotent recomputations, so last-write-wins is
//! fine.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::resolve::Resolution;

struct CacheEntry {
    resolution: Resolution,
    inserted_at: Instant,
}

/// In-memory geocode result cache with per-entry TTL and a capacity bound.
pub struct GeocodeCache {
    ttl: Duration,
    max_entries: usize,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl GeocodeCache {
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a live entry for `query`. Expired entries are removed on read.
    #[must_use]
    pub fn get(&self, query: &str) -> Option<Resolution> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match entries.get(query) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                Some(entry.resolution.clone())
            }
            Some(_) => {
                entries.remove(query);
                None
            }
            None => None,
        }
    }

    /// Store a resolution for `query`, evicting expired entries first and the
    /// oldest live entry when still at capacity.
    pub fn insert(&self, query: &str, resolution: &Resolution) {
        if self.max_entries == 0 {
            return;
        }
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if entries.len() >= self.max_entries && !entries.contains_key(query) {
            let ttl = self.ttl;
            entries.retain(|_, e| e.inserted_at.elapsed() < ttl);
        }
        if entries.len() >= self.max_entries && !entries.contains_key(query) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone());
            if let Some(key) = oldest {
                entries.remove(&key);
            }
        }

        entries.insert(
            query.to_string(),
            CacheEntry {
                resolution: resolution.clone(),
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of entries currently stored, live or expired.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
