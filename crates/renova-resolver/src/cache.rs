//! Resolution cache
//!
//! Remembers, per canonical file name, the first candidate that loaded.
//! Entries are written once and trusted for the lifetime of the store:
//! there is no invalidation, and a later success never overwrites an
//! earlier one. Dropping the store is the only way to forget.

use dashmap::DashMap;
use std::fmt::Debug;
use std::sync::{Arc, OnceLock};

/// Key-value store consulted by the resolver
pub trait ResolutionStore: Send + Sync + Debug {
    /// Candidate that previously loaded for `key`
    fn lookup(&self, key: &str) -> Option<String>;

    /// Record `candidate` for `key` unless an entry exists
    ///
    /// Returns `true` if this call wrote the entry.
    fn record_if_absent(&self, key: &str, candidate: &str) -> bool;

    /// Number of remembered entries
    fn len(&self) -> usize;

    /// Whether nothing has been remembered yet
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Concurrent first-writer-wins store backed by `DashMap`
///
/// Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct ResolutionCache {
    entries: Arc<DashMap<String, String>>,
}

impl ResolutionCache {
    /// Create an empty, isolated cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache shared by every resolver that asks for it
    #[must_use]
    pub fn global() -> Self {
        static GLOBAL: OnceLock<ResolutionCache> = OnceLock::new();
        GLOBAL.get_or_init(Self::new).clone()
    }
}

impl ResolutionStore for ResolutionCache {
    fn lookup(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn record_if_absent(&self, key: &str, candidate: &str) -> bool {
        let mut written = false;
        self.entries.entry(key.to_string()).or_insert_with(|| {
            written = true;
            candidate.to_string()
        });
        if written {
            tracing::info!(key, candidate, "caching successful image source");
        }
        written
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_missing() {
        let cache = ResolutionCache::new();
        assert!(cache.lookup("a.jpg").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn first_writer_wins() {
        let cache = ResolutionCache::new();
        assert!(cache.record_if_absent("a.jpg", "/api/images/a.jpg"));
        assert!(!cache.record_if_absent("a.jpg", "/placeholder.jpg"));
        assert_eq!(cache.lookup("a.jpg").as_deref(), Some("/api/images/a.jpg"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn repeated_identical_write_is_noop() {
        let cache = ResolutionCache::new();
        cache.record_if_absent("a.jpg", "/api/images/a.jpg");
        cache.record_if_absent("a.jpg", "/api/images/a.jpg");
        assert_eq!(cache.lookup("a.jpg").as_deref(), Some("/api/images/a.jpg"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clones_share_entries() {
        let cache = ResolutionCache::new();
        let other = cache.clone();
        other.record_if_absent("b.png", "b.png");
        assert_eq!(cache.lookup("b.png").as_deref(), Some("b.png"));
    }

    #[test]
    fn separate_instances_are_isolated() {
        let a = ResolutionCache::new();
        let b = ResolutionCache::new();
        a.record_if_absent("c.jpg", "c.jpg");
        assert!(b.lookup("c.jpg").is_none());
    }

    #[test]
    fn concurrent_writers_agree_on_one_entry() {
        let cache = ResolutionCache::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || cache.record_if_absent("d.jpg", &format!("source-{i}")))
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
        assert_eq!(cache.len(), 1);
    }
}
