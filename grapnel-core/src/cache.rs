//! # Reflection Cache
//!
//! Schema discovery costs several reflection round-trips per host, and a UI asks for it
//! on every focus change. This module memoizes the per-host listing for a fixed TTL so
//! repeated interactions within a session hit the map instead of the network.
//!
//! The cache is process-wide state: constructed once at startup, shared by reference,
//! never persisted. Stale entries are treated as missing but are not evicted; the map
//! is bounded by the number of distinct hosts a user probes, which is small in the
//! interactive use case.
use crate::schema::ServiceSchema;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// How long a cached reflection listing stays fresh.
pub const CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Vec<ServiceSchema>,
    /// Seconds since the epoch at insertion.
    timestamp: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: u64) -> bool {
        now.saturating_sub(self.timestamp) > CACHE_TTL_SECS
    }
}

/// A concurrent host → reflection-listing map with time-based expiry.
///
/// Readers and writers may run concurrently: lookups share a read lock, stores take the
/// write lock. Freshness is computed under the read lock; whether to refresh an expired
/// entry is the caller's decision.
#[derive(Debug, Default)]
pub struct ReflectionCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ReflectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached listing for `host` iff it is still fresh.
    pub fn lookup(&self, host: &str) -> Option<Vec<ServiceSchema>> {
        let now = epoch_seconds();
        let entries = self.entries.read().expect("reflection cache lock poisoned");
        entries
            .get(host)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.data.clone())
    }

    /// Stores a listing for `host`, stamping it with the current time.
    pub fn store(&self, host: &str, data: Vec<ServiceSchema>) {
        self.store_at(host, data, epoch_seconds());
    }

    fn store_at(&self, host: &str, data: Vec<ServiceSchema>, timestamp: u64) {
        let mut entries = self.entries.write().expect("reflection cache lock poisoned");
        entries.insert(host.to_string(), CacheEntry { data, timestamp });
    }
}

fn epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_returned() {
        let cache = ReflectionCache::new();
        cache.store("grpcb.in:443", vec![]);
        assert!(cache.lookup("grpcb.in:443").is_some());
    }

    #[test]
    fn missing_host_is_none() {
        let cache = ReflectionCache::new();
        assert!(cache.lookup("nope").is_none());
    }

    #[test]
    fn entry_at_ttl_boundary_is_still_fresh() {
        let cache = ReflectionCache::new();
        cache.store_at("h", vec![], epoch_seconds() - CACHE_TTL_SECS);
        assert!(cache.lookup("h").is_some());
    }

    #[test]
    fn entry_past_ttl_is_treated_as_missing() {
        let cache = ReflectionCache::new();
        cache.store_at("h", vec![], epoch_seconds() - CACHE_TTL_SECS - 1);
        assert!(cache.lookup("h").is_none());
    }

    #[test]
    fn store_refreshes_an_expired_entry() {
        let cache = ReflectionCache::new();
        cache.store_at("h", vec![], epoch_seconds() - CACHE_TTL_SECS - 1);
        cache.store("h", vec![]);
        assert!(cache.lookup("h").is_some());
    }
}
