use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Default lifetime of a resolved lookup: 24 hours.
pub const DEFAULT_LOOKUP_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct CacheEntry<T> {
    value: T,
    inserted_at: DateTime<Utc>,
}

/// In-memory TTL cache of lookup results keyed by barcode.
///
/// The cache is instance-local. Several service instances each warm their
/// own copy; the database stays the shared source of truth.
///
/// Not `Sync` by itself, callers wrap it in `Arc<Mutex<LookupCache<_>>>`.
pub struct LookupCache<T: Clone> {
    entries: HashMap<String, CacheEntry<T>>,
    ttl: Duration,
}

impl<T: Clone> LookupCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Returns the cached value only when still within TTL.
    pub fn get(&self, key: &str) -> Option<T> {
        self.get_at(key, Utc::now())
    }

    /// Same as [`get`](Self::get) with an explicit "now".
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        self.entries
            .get(key)
            .filter(|entry| is_fresh(self.ttl, entry.inserted_at, now))
            .map(|entry| entry.value.clone())
    }

    /// Insert or overwrite, stamping the current time.
    pub fn put(&mut self, key: impl Into<String>, value: T) {
        self.put_at(key, value, Utc::now());
    }

    /// Insert or overwrite as of `now`. Entries already stale at `now` are
    /// dropped.
    pub fn put_at(&mut self, key: impl Into<String>, value: T, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| is_fresh(ttl, entry.inserted_at, now));
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                inserted_at: now,
            },
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_fresh(ttl: Duration, inserted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    match (now - inserted_at).to_std() {
        Ok(age) => age <= ttl,
        // Inserted "in the future" relative to `now`: clock skew, still fresh.
        Err(_) => true,
    }
}
