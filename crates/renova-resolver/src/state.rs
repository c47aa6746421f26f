//! Per-image resolution state machine
//!
//! ```text
//! Trying(start) ──fail──▶ Trying(start+1) ──fail──▶ … ──▶ Trying(N-1)
//!      │                        │                             │
//!   success                  success                       success
//!      ▼                        ▼                             ▼
//!  Loaded(i)                Loaded(i)                     Loaded(N-1)
//! ```
//!
//! Transitions only move forward, and every candidate is attempted at most
//! once. `Trying(N-1)` (the placeholder) absorbs further failures; `Loaded`
//! absorbs everything.

use crate::cache::ResolutionStore;
use crate::candidates::{resolve, CandidateList, CandidateTemplates};
use crate::reference::ImageReference;

/// Where a resolution currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPhase {
    /// Waiting for the outcome of candidate `i`
    Trying(usize),
    /// Candidate `i` loaded
    Loaded(usize),
}

impl ResolutionPhase {
    /// Index of the displayed candidate
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Trying(i) | Self::Loaded(i) => i,
        }
    }
}

/// Result of reporting a load failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Moved to the next candidate
    Advanced {
        /// Candidate that failed
        from: usize,
        /// Candidate now displayed
        to: usize,
    },
    /// Already on the placeholder; nothing left to try
    Exhausted,
    /// Already loaded; the event was dropped
    Ignored,
}

/// Index to start from given a cached source
///
/// Jumps straight to the cached candidate when it is one of `candidates`,
/// otherwise starts at the original reference.
#[must_use]
pub fn initial_candidate_index(candidates: &CandidateList, cached: Option<&str>) -> usize {
    cached
        .and_then(|url| candidates.position(url))
        .unwrap_or(0)
}

/// Resolution progress for one displayed image
#[derive(Debug, Clone)]
pub struct ImageResolution {
    reference: ImageReference,
    candidates: CandidateList,
    phase: ResolutionPhase,
}

impl ImageResolution {
    /// Start resolving `reference`, consulting `store` for a known-good source
    #[must_use]
    pub fn start(
        reference: ImageReference,
        templates: &CandidateTemplates,
        store: &dyn ResolutionStore,
    ) -> Self {
        let candidates = resolve(&reference, templates);
        let cached = store.lookup(reference.cache_key());
        let start = initial_candidate_index(&candidates, cached.as_deref());
        if start > 0 {
            tracing::debug!(
                key = reference.cache_key(),
                index = start,
                "resuming image from cached source"
            );
        }
        Self {
            reference,
            candidates,
            phase: ResolutionPhase::Trying(start),
        }
    }

    /// Reference being resolved
    #[inline]
    #[must_use]
    pub fn reference(&self) -> &ImageReference {
        &self.reference
    }

    /// All candidates in order
    #[inline]
    #[must_use]
    pub fn candidates(&self) -> &CandidateList {
        &self.candidates
    }

    /// Current phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> ResolutionPhase {
        self.phase
    }

    /// Index of the displayed candidate
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.phase.index()
    }

    /// Source currently displayed
    #[inline]
    #[must_use]
    pub fn current(&self) -> &str {
        // Index is always within the fixed-size list.
        self.candidates.get(self.index()).unwrap_or(self.candidates.last())
    }

    /// Whether the displayed candidate loaded
    #[inline]
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self.phase, ResolutionPhase::Loaded(_))
    }

    /// Report that the displayed candidate loaded
    ///
    /// Remembers it in `store` unless an entry already exists for this
    /// file name. Returns `true` if the store was written.
    pub fn on_load_success(&mut self, store: &dyn ResolutionStore) -> bool {
        let index = self.index();
        let written = store.record_if_absent(self.reference.cache_key(), self.current());
        self.phase = ResolutionPhase::Loaded(index);
        written
    }

    /// Report that the displayed candidate failed to load
    pub fn on_load_failure(&mut self) -> Transition {
        match self.phase {
            ResolutionPhase::Loaded(_) => Transition::Ignored,
            ResolutionPhase::Trying(i) if self.candidates.is_terminal(i) => Transition::Exhausted,
            ResolutionPhase::Trying(i) => {
                let next = i + 1;
                tracing::debug!(
                    failed = self.candidates.get(i),
                    next = self.candidates.get(next),
                    "image load failed, trying next source"
                );
                self.phase = ResolutionPhase::Trying(next);
                Transition::Advanced { from: i, to: next }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResolutionCache;

    fn start(raw: &str, store: &ResolutionCache) -> ImageResolution {
        ImageResolution::start(
            ImageReference::new(raw).unwrap(),
            &CandidateTemplates::default(),
            store,
        )
    }

    #[test]
    fn fresh_resolution_starts_at_original() {
        let store = ResolutionCache::new();
        let res = start("a.jpg", &store);
        assert_eq!(res.phase(), ResolutionPhase::Trying(0));
        assert_eq!(res.current(), "a.jpg");
    }

    #[test]
    fn cache_hit_starts_at_cached_source() {
        let store = ResolutionCache::new();
        store.record_if_absent("a.jpg", "/api/images/a.jpg");
        let res = start("a.jpg", &store);
        assert_eq!(res.index(), 1);
        assert_eq!(res.current(), "/api/images/a.jpg");
    }

    #[test]
    fn cache_hit_outside_list_starts_at_zero() {
        let store = ResolutionCache::new();
        store.record_if_absent("a.jpg", "https://elsewhere/a.jpg");
        let res = start("a.jpg", &store);
        assert_eq!(res.index(), 0);
    }

    #[test]
    fn failures_walk_forward_then_stop() {
        let store = ResolutionCache::new();
        let mut res = start("a.jpg", &store);
        let expected: Vec<String> = res.candidates().iter().map(String::from).collect();

        for i in 0..4 {
            assert_eq!(res.on_load_failure(), Transition::Advanced { from: i, to: i + 1 });
            assert_eq!(res.current(), expected[i + 1]);
        }
        assert_eq!(res.current(), "/placeholder.jpg");
        assert_eq!(res.on_load_failure(), Transition::Exhausted);
        assert_eq!(res.current(), "/placeholder.jpg");
    }

    #[test]
    fn success_records_and_absorbs() {
        let store = ResolutionCache::new();
        let mut res = start("a.jpg", &store);
        res.on_load_failure();
        assert!(res.on_load_success(&store));
        assert!(res.is_loaded());
        assert_eq!(store.lookup("a.jpg").as_deref(), Some("/api/images/a.jpg"));
        assert_eq!(res.on_load_failure(), Transition::Ignored);
        assert_eq!(res.current(), "/api/images/a.jpg");
    }

    #[test]
    fn success_does_not_overwrite_existing_entry() {
        let store = ResolutionCache::new();
        store.record_if_absent("a.jpg", "a.jpg");
        let mut res = start("a.jpg", &store);
        res.on_load_failure();
        assert!(!res.on_load_success(&store));
        assert_eq!(store.lookup("a.jpg").as_deref(), Some("a.jpg"));
    }

    #[test]
    fn initial_index_without_cache() {
        let store = ResolutionCache::new();
        let res = start("b.jpg", &store);
        assert_eq!(initial_candidate_index(res.candidates(), None), 0);
    }
}
