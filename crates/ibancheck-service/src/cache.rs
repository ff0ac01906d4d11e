//! Time-bounded response cache with lazy expiry.
//!
//! Keys are derived from the request (identifier + flag set, see
//! [`crate::pipeline::ValidationRequest::cache_key`]); values are the
//! serialized response body together with the status code it was first
//! served with, so a cache hit replays the exact original response.
//!
//! Expiry is lazy: `get` is the source of truth and treats an expired entry
//! as absent. A periodic [`ResponseCache::purge_expired`] sweep keeps the
//! map from accumulating dead entries, but correctness never depends on it.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use axum::http::StatusCode;

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    status: StatusCode,
    inserted_at: Instant,
    /// `None` means the entry never expires.
    ttl: Option<Duration>,
}

impl CacheEntry {
    fn expired(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.duration_since(self.inserted_at) >= ttl,
            None => false,
        }
    }
}

/// Concurrent key → response cache shared by all request workers.
///
/// Reads and writes from concurrent requests go through the interior
/// `RwLock`; a read during a concurrent write observes either the old or
/// the new entry, never a torn one. Concurrent misses for the same key may
/// both compute and both store; the overwrite is idempotent.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a fresh entry, evicting it if its TTL has elapsed.
    pub fn get(&self, key: &str) -> Option<(String, StatusCode)> {
        {
            let entries = self.entries.read().expect("cache lock poisoned");
            match entries.get(key) {
                Some(entry) if !entry.expired(Instant::now()) => {
                    return Some((entry.body.clone(), entry.status));
                }
                Some(_) => {}
                None => return None,
            }
        }

        // The entry was expired under the read lock. Re-check under the
        // write lock: a concurrent set may have replaced it with a fresh
        // entry, which must not be evicted.
        let mut entries = self.entries.write().expect("cache lock poisoned");
        if entries
            .get(key)
            .is_some_and(|entry| entry.expired(Instant::now()))
        {
            entries.remove(key);
        }
        None
    }

    /// Store a response under `key`.
    ///
    /// `ttl = None` means the entry never expires, used for verdicts that
    /// are stable facts about an identifier.
    pub fn set(&self, key: &str, body: String, status: StatusCode, ttl: Option<Duration>) {
        let entry = CacheEntry {
            body,
            status,
            inserted_at: Instant::now(),
            ttl,
        };
        self.entries
            .write()
            .expect("cache lock poisoned")
            .insert(key.to_string(), entry);
    }

    /// Drop every expired entry. Called from the background sweeper.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries
            .write()
            .expect("cache lock poisoned")
            .retain(|_, entry| !entry.expired(now));
    }

    /// Number of entries currently stored, expired or not.
    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
