//! # Thread Response Cache
//!
//! A short-lived read-side cache keyed by (user id, thread id).
//! Entries expire on a fixed TTL instead of being invalidated on write,
//! so a reader can observe stale thread content for up to one TTL after
//! an edit — a deliberate latency/consistency trade-off, not a defect.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::messages::Message;

/// Default time-to-live for cached thread responses
pub const DEFAULT_THREAD_CACHE_TTL: Duration = Duration::from_secs(60);

struct CacheEntry {
    messages: Vec<Message>,
    cached_at: Instant,
}

/// TTL cache of per-user thread responses
///
/// Keyed by (user id, thread id) because thread reads are
/// access-checked per user; two users never share an entry.
pub struct ThreadCache {
    ttl: Duration,
    entries: RwLock<HashMap<(i64, String), CacheEntry>>,
}

impl ThreadCache {
    /// Create a cache with the default TTL
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_THREAD_CACHE_TTL)
    }

    /// Create a cache with a custom TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get a cached thread response, if present and fresh
    pub fn get(&self, user_id: i64, thread_id: &str) -> Option<Vec<Message>> {
        let entries = self.entries.read();
        let entry = entries.get(&(user_id, thread_id.to_string()))?;

        if entry.cached_at.elapsed() >= self.ttl {
            return None;
        }

        Some(entry.messages.clone())
    }

    /// Store a thread response
    pub fn insert(&self, user_id: i64, thread_id: &str, messages: Vec<Message>) {
        self.entries.write().insert(
            (user_id, thread_id.to_string()),
            CacheEntry {
                messages,
                cached_at: Instant::now(),
            },
        );
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.cached_at.elapsed() < self.ttl);
        before - entries.len()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of entries currently held, fresh or expired
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for ThreadCache {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: i64, content: &str) -> Message {
        Message {
            id,
            sender_id: 1,
            receiver_id: 2,
            conversation_id: None,
            content: content.to_string(),
            timestamp: 1000,
            edited: false,
            read: false,
            parent_id: None,
            thread_id: "t1".to_string(),
        }
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = ThreadCache::new();
        cache.insert(1, "t1", vec![message(1, "Hello")]);

        let hit = cache.get(1, "t1").unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].content, "Hello");
    }

    #[test]
    fn test_miss_on_unknown_key() {
        let cache = ThreadCache::new();
        cache.insert(1, "t1", vec![message(1, "Hello")]);

        assert!(cache.get(1, "t2").is_none());
        // Same thread, different user: separate entries
        assert!(cache.get(2, "t1").is_none());
    }

    #[test]
    fn test_expired_entry_misses() {
        let cache = ThreadCache::with_ttl(Duration::ZERO);
        cache.insert(1, "t1", vec![message(1, "Hello")]);

        assert!(cache.get(1, "t1").is_none());
    }

    #[test]
    fn test_purge_expired() {
        let cache = ThreadCache::with_ttl(Duration::ZERO);
        cache.insert(1, "t1", vec![message(1, "a")]);
        cache.insert(1, "t2", vec![message(2, "b")]);
        assert_eq!(cache.len(), 2);

        let removed = cache.purge_expired();
        assert_eq!(removed, 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_replaces_existing_entry() {
        let cache = ThreadCache::new();
        cache.insert(1, "t1", vec![message(1, "old")]);
        cache.insert(1, "t1", vec![message(1, "new")]);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1, "t1").unwrap()[0].content, "new");
    }

    #[test]
    fn test_clear() {
        let cache = ThreadCache::new();
        cache.insert(1, "t1", vec![message(1, "a")]);
        cache.clear();
        assert!(cache.is_empty());
    }
}
