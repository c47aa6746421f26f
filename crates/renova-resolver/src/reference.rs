//! Image references
//!
//! An [`ImageReference`] names an image in any form the site hands out: an
//! absolute URL, a relative path, or a bare file name. Its canonical file
//! name (last path segment, query removed) is the key the resolution cache
//! is indexed by.

use crate::error::ResolveError;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Non-empty string naming an image
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference(String);

impl ImageReference {
    /// Create reference, rejecting empty input
    ///
    /// # Errors
    /// Returns [`ResolveError::EmptyReference`] if `raw` is empty
    pub fn new(raw: impl Into<String>) -> Result<Self, ResolveError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ResolveError::EmptyReference);
        }
        Ok(Self(raw))
    }

    /// Reference as given
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment with any query string removed (may be empty)
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> &str {
        canonical_file_name(&self.0)
    }

    /// Key used by the resolution cache
    ///
    /// Falls back to the whole reference when the file name is empty
    /// (e.g. `"gallery/"`).
    #[inline]
    #[must_use]
    pub fn cache_key(&self) -> &str {
        match self.file_name() {
            "" => &self.0,
            name => name,
        }
    }
}

/// Extract the canonical file name of a reference
///
/// # Examples
/// - `"x/y/z.jpg?v=2"` → `"z.jpg"`
/// - `"photo.png"` → `"photo.png"`
/// - `"http://host/uploads/"` → `""`
#[must_use]
pub fn canonical_file_name(reference: &str) -> &str {
    let without_query = reference.split('?').next().unwrap_or(reference);
    without_query.rsplit('/').next().unwrap_or(without_query)
}

impl Display for ImageReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ImageReference {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for ImageReference {
    type Error = ResolveError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for ImageReference {
    type Error = ResolveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for ImageReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
