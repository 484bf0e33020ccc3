//! Session grant cache
//!
//! Remembers which risk patterns the user has already approved during the
//! current process session, so equivalent operations are not re-prompted.
//! Grants live only in memory and are lost on restart; they are a
//! within-session convenience, not a durable authorization record.
//!
//! The cache is the one piece of truly mutable shared state in the
//! permission engine, so every access goes through a single mutex.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// In-memory map of pattern id -> grant time
#[derive(Debug, Default)]
pub struct SessionGrantCache {
    grants: Mutex<HashMap<String, Instant>>,
}

impl SessionGrantCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a grant for the pattern, stamped now
    ///
    /// Idempotent: a repeat grant refreshes the timestamp and leaves
    /// exactly one entry.
    pub fn grant(&self, pattern_id: &str) {
        self.grant_at(pattern_id, Instant::now());
    }

    fn grant_at(&self, pattern_id: &str, at: Instant) {
        let mut grants = self.grants.lock().unwrap();
        tracing::debug!("Session grant recorded for pattern {}", pattern_id);
        grants.insert(pattern_id.to_string(), at);
    }

    /// Remove a grant; a missing id is a no-op
    pub fn revoke(&self, pattern_id: &str) {
        self.grants.lock().unwrap().remove(pattern_id);
    }

    /// Drop all grants (session boundary, e.g. a new conversation)
    pub fn clear(&self) {
        self.grants.lock().unwrap().clear();
    }

    /// Whether the pattern has a grant younger than `timeout`
    pub fn is_valid(&self, pattern_id: &str, timeout: Duration) -> bool {
        self.is_valid_at(pattern_id, timeout, Instant::now())
    }

    fn is_valid_at(&self, pattern_id: &str, timeout: Duration, now: Instant) -> bool {
        let grants = self.grants.lock().unwrap();
        match grants.get(pattern_id) {
            Some(granted_at) => now.duration_since(*granted_at) < timeout,
            None => false,
        }
    }

    /// Number of grants currently held (valid or not)
    pub fn len(&self) -> usize {
        self.grants.lock().unwrap().len()
    }

    /// True when no grants are held
    pub fn is_empty(&self) -> bool {
        self.grants.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_and_validity_window() {
        let cache = SessionGrantCache::new();
        let start = Instant::now();
        cache.grant_at("p1", start);

        let timeout = Duration::from_secs(60);
        assert!(cache.is_valid_at("p1", timeout, start + Duration::from_secs(59)));
        assert!(!cache.is_valid_at("p1", timeout, start + Duration::from_secs(61)));
        // Boundary: exactly at the timeout the grant has expired
        assert!(!cache.is_valid_at("p1", timeout, start + Duration::from_secs(60)));
    }

    #[test]
    fn test_unknown_pattern_is_invalid() {
        let cache = SessionGrantCache::new();
        assert!(!cache.is_valid("nope", Duration::from_secs(60)));
    }

    #[test]
    fn test_grant_is_idempotent() {
        let cache = SessionGrantCache::new();
        cache.grant("p1");
        cache.grant("p1");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_repeat_grant_refreshes_timestamp() {
        let cache = SessionGrantCache::new();
        let start = Instant::now();
        cache.grant_at("p1", start);
        cache.grant_at("p1", start + Duration::from_secs(50));

        let timeout = Duration::from_secs(60);
        assert!(cache.is_valid_at("p1", timeout, start + Duration::from_secs(100)));
    }

    #[test]
    fn test_revoke_is_a_no_op_on_missing() {
        let cache = SessionGrantCache::new();
        cache.revoke("nope");
        cache.grant("p1");
        cache.revoke("p1");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_drops_everything() {
        let cache = SessionGrantCache::new();
        cache.grant("p1");
        cache.grant("p2");
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_grants_do_not_lose_updates() {
        use std::sync::Arc;

        let cache = Arc::new(SessionGrantCache::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let cache = cache.clone();
            handles.push(std::thread::spawn(move || {
                for j in 0..50 {
                    cache.grant(&format!("p{}", (i + j) % 4));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 4);
    }
}
