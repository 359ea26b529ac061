#![forbid(unsafe_code)]

//! Time-bounded cache with insertion-order eviction.
//!
//! Entries expire individually after a fixed TTL regardless of access
//! pattern, and when the cache is at capacity the oldest-inserted entry is
//! evicted first. Expiry is lazy: stale entries are dropped when touched or
//! when [`purge_expired`](TtlCache::purge_expired) runs, never by a
//! background timer.

use std::collections::VecDeque;
use std::hash::Hash;
use std::time::Duration;

use ahash::AHashMap;
use web_time::Instant;

/// Statistics about cache performance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    /// Number of entries currently in the cache.
    pub entries: usize,
    /// Total hits since creation.
    pub hits: u64,
    /// Total misses since creation (including expired lookups).
    pub misses: u64,
    /// Entries evicted to make room at capacity.
    pub evictions: u64,
    /// Hit rate as a fraction (0.0 to 1.0).
    pub hit_rate: f64,
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    inserted: Instant,
}

/// A TTL cache keyed by `K`.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    map: AHashMap<K, Entry<V>>,
    /// Insertion order; may hold stale keys that are skipped on eviction.
    order: VecDeque<K>,
    ttl: Duration,
    max_entries: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<K: Eq + Hash + Clone, V> TtlCache<K, V> {
    /// Create a cache with the given per-entry TTL and capacity.
    ///
    /// A capacity of zero is treated as one entry.
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            map: AHashMap::new(),
            order: VecDeque::new(),
            ttl,
            max_entries: max_entries.max(1),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Look up a live entry. Expired entries are dropped and count as
    /// misses.
    pub fn get(&mut self, key: &K, now: Instant) -> Option<&V> {
        if self.expire_if_stale(key, now) {
            self.misses += 1;
            return None;
        }
        match self.map.get(key) {
            Some(entry) => {
                self.hits += 1;
                Some(&entry.value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert or replace an entry. Replacement refreshes both the TTL and
    /// the insertion-order position.
    pub fn set(&mut self, key: K, value: V, now: Instant) {
        if self.map.contains_key(&key) {
            self.order.retain(|k| k != &key);
        }
        let _ = self.map.insert(
            key.clone(),
            Entry {
                value,
                inserted: now,
            },
        );
        self.order.push_back(key);
        self.evict_over_capacity();
    }

    /// Whether a live entry exists. Does not touch the hit/miss counters.
    pub fn has(&mut self, key: &K, now: Instant) -> bool {
        !self.expire_if_stale(key, now) && self.map.contains_key(key)
    }

    /// Remove an entry. Returns whether it existed (live or expired).
    pub fn delete(&mut self, key: &K) -> bool {
        let existed = self.map.remove(key).is_some();
        if existed {
            self.order.retain(|k| k != key);
        }
        existed
    }

    /// Drop everything. Counters survive.
    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    /// Drop all expired entries now.
    pub fn purge_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.map.retain(|_, entry| {
            now.checked_duration_since(entry.inserted)
                .unwrap_or(Duration::ZERO)
                < ttl
        });
        self.order.retain(|k| self.map.contains_key(k));
    }

    /// Number of entries, counting not-yet-purged expired ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The per-entry TTL.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Performance counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        CacheStats {
            entries: self.map.len(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            hit_rate: if total == 0 {
                0.0
            } else {
                self.hits as f64 / total as f64
            },
        }
    }

    /// Remove `key` if its entry has outlived the TTL. Returns whether an
    /// expired entry was dropped.
    fn expire_if_stale(&mut self, key: &K, now: Instant) -> bool {
        let stale = self.map.get(key).is_some_and(|entry| {
            now.checked_duration_since(entry.inserted)
                .unwrap_or(Duration::ZERO)
                >= self.ttl
        });
        if stale {
            let _ = self.map.remove(key);
            self.order.retain(|k| k != key);
        }
        stale
    }

    fn evict_over_capacity(&mut self) {
        while self.map.len() > self.max_entries {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if self.map.remove(&oldest).is_some() {
                self.evictions += 1;
            }
        }
    }
}
