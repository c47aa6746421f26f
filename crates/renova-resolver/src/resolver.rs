//! Resolver facade tying templates to a shared store

use crate::cache::{ResolutionCache, ResolutionStore};
use crate::candidates::{resolve, CandidateList, CandidateTemplates};
use crate::error::ResolveError;
use crate::reference::ImageReference;
use crate::state::{ImageResolution, Transition};
use std::sync::Arc;

/// Builds resolutions that share one resolution store
#[derive(Debug, Clone)]
pub struct ImageResolver {
    templates: CandidateTemplates,
    store: Arc<dyn ResolutionStore>,
}

impl ImageResolver {
    /// Create resolver over an explicit store
    #[inline]
    #[must_use]
    pub fn new(templates: CandidateTemplates, store: Arc<dyn ResolutionStore>) -> Self {
        Self { templates, store }
    }

    /// Create resolver over a fresh, isolated [`ResolutionCache`]
    #[inline]
    #[must_use]
    pub fn isolated(templates: CandidateTemplates) -> Self {
        Self::new(templates, Arc::new(ResolutionCache::new()))
    }

    /// Create resolver over the process-wide [`ResolutionCache`]
    #[inline]
    #[must_use]
    pub fn shared(templates: CandidateTemplates) -> Self {
        Self::new(templates, Arc::new(ResolutionCache::global()))
    }

    /// Templates in use
    #[inline]
    #[must_use]
    pub fn templates(&self) -> &CandidateTemplates {
        &self.templates
    }

    /// Backing store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &dyn ResolutionStore {
        self.store.as_ref()
    }

    /// Candidate list for a raw reference
    ///
    /// # Errors
    /// Returns [`ResolveError::EmptyReference`] for empty input
    pub fn resolve(&self, raw: &str) -> Result<CandidateList, ResolveError> {
        let reference = ImageReference::new(raw)?;
        Ok(resolve(&reference, &self.templates))
    }

    /// Begin resolving a raw reference
    ///
    /// Call again with a new reference to restart (a remount).
    ///
    /// # Errors
    /// Returns [`ResolveError::EmptyReference`] for empty input
    pub fn begin(&self, raw: &str) -> Result<ImageResolution, ResolveError> {
        let reference = ImageReference::new(raw)?;
        Ok(ImageResolution::start(
            reference,
            &self.templates,
            self.store.as_ref(),
        ))
    }

    /// Report a successful load for `resolution`
    pub fn complete(&self, resolution: &mut ImageResolution) -> bool {
        resolution.on_load_success(self.store.as_ref())
    }

    /// Report a failed load for `resolution`
    pub fn fail(&self, resolution: &mut ImageResolution) -> Transition {
        resolution.on_load_failure()
    }
}

impl Default for ImageResolver {
    /// Default templates over an isolated cache
    fn default() -> Self {
        Self::isolated(CandidateTemplates::default())
    }
}
