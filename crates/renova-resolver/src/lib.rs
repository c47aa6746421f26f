//! Renova image resolver
//!
//! Degrades an image gracefully across every place it might be hosted, and
//! remembers which place worked.
//!
//! # Overview
//!
//! - **ImageReference**: validated image name (URL, path, or bare file name)
//! - **CandidateList**: the fixed five sources tried for a reference
//! - **ResolutionCache**: first-writer-wins map of file name → working source
//! - **ImageResolution**: forward-only state machine driven by load events
//!
//! # Example
//!
//! ```rust
//! use renova_resolver::{ImageResolver, Transition};
//!
//! let resolver = ImageResolver::default();
//!
//! let mut image = resolver.begin("gallery/porch.jpg?v=3").unwrap();
//! assert_eq!(image.current(), "gallery/porch.jpg?v=3");
//!
//! // The original reference failed to load; move on.
//! assert_eq!(resolver.fail(&mut image), Transition::Advanced { from: 0, to: 1 });
//! assert_eq!(image.current(), "/api/images/porch.jpg");
//!
//! // The proxy worked; remember it for the next render.
//! resolver.complete(&mut image);
//! let again = resolver.begin("porch.jpg").unwrap();
//! assert_eq!(again.current(), "/api/images/porch.jpg");
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod candidates;
pub mod error;
pub mod project;
pub mod reference;
pub mod resolver;
pub mod state;

// Re-exports
pub use cache::{ResolutionCache, ResolutionStore};
pub use candidates::{resolve, CandidateList, CandidateTemplates, CANDIDATE_COUNT, DEFAULT_PLACEHOLDER};
pub use error::ResolveError;
pub use project::{Project, ProjectId, ProjectRecord};
pub use reference::{canonical_file_name, ImageReference};
pub use resolver::ImageResolver;
pub use state::{initial_candidate_index, ImageResolution, ResolutionPhase, Transition};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for image resolution
    pub use crate::{
        CandidateList, CandidateTemplates, ImageReference, ImageResolution, ImageResolver,
        Project, ResolutionCache, ResolutionStore, Transition,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
