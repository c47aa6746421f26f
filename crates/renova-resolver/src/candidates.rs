//! Candidate lists
//!
//! Every image reference expands into the same five ordered sources:
//!
//! ```text
//! [original, proxy/{file}, remote_primary/{file}, remote_secondary/{file}, placeholder]
//! ```
//!
//! The list is backed by a fixed-size array so the length and the terminal
//! placeholder are guaranteed by construction.

use crate::reference::ImageReference;
use serde::{Deserialize, Serialize};

/// Number of candidates produced for every reference
pub const CANDIDATE_COUNT: usize = 5;

/// Placeholder served when every other source fails
pub const DEFAULT_PLACEHOLDER: &str = "/placeholder.jpg";

/// URL templates the candidate list is built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateTemplates {
    /// Local proxy route prefix
    pub proxy_prefix: String,
    /// First direct remote location
    pub remote_primary: String,
    /// Second direct remote location
    pub remote_secondary: String,
    /// Static placeholder path
    pub placeholder: String,
}

impl CandidateTemplates {
    /// Create default templates
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With proxy prefix
    #[inline]
    #[must_use]
    pub fn with_proxy_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.proxy_prefix = prefix.into();
        self
    }

    /// With both remote locations
    #[inline]
    #[must_use]
    pub fn with_remotes(
        mut self,
        primary: impl Into<String>,
        secondary: impl Into<String>,
    ) -> Self {
        self.remote_primary = primary.into();
        self.remote_secondary = secondary.into();
        self
    }

    /// With placeholder path
    #[inline]
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }
}

impl Default for CandidateTemplates {
    fn default() -> Self {
        Self {
            proxy_prefix: "/api/images".to_string(),
            remote_primary: "http://127.0.0.1:8080/uploads".to_string(),
            remote_secondary: "http://127.0.0.1:8080/images".to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

/// Ordered, immutable list of sources to try for one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CandidateList([String; CANDIDATE_COUNT]);

impl CandidateList {
    /// Candidate at `index`
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Index of the first candidate equal to `url`
    #[inline]
    #[must_use]
    pub fn position(&self, url: &str) -> Option<usize> {
        self.0.iter().position(|c| c == url)
    }

    /// Terminal candidate (the placeholder)
    #[inline]
    #[must_use]
    pub fn last(&self) -> &str {
        &self.0[CANDIDATE_COUNT - 1]
    }

    /// Always [`CANDIDATE_COUNT`]
    #[inline]
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn len(&self) -> usize {
        CANDIDATE_COUNT
    }

    /// Never empty; present for API symmetry with `len`
    #[inline]
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `index` is the last candidate
    #[inline]
    #[must_use]
    pub fn is_terminal(&self, index: usize) -> bool {
        index + 1 >= self.len()
    }

    /// Iterate candidates in order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Candidates as a slice
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a CandidateList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Expand a reference into its candidate list
#[must_use]
pub fn resolve(reference: &ImageReference, templates: &CandidateTemplates) -> CandidateList {
    let file = reference.file_name();
    CandidateList([
        reference.as_str().to_string(),
        join(&templates.proxy_prefix, file),
        join(&templates.remote_primary, file),
        join(&templates.remote_secondary, file),
        templates.placeholder.clone(),
    ])
}

fn join(prefix: &str, file: &str) -> String {
    format!("{}/{file}", prefix.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reference(raw: &str) -> ImageReference {
        ImageReference::new(raw).unwrap()
    }

    #[test]
    fn bare_name_expands_in_order() {
        let list = resolve(&reference("a.jpg"), &CandidateTemplates::default());
        assert_eq!(
            list.as_slice(),
            &[
                "a.jpg",
                "/api/images/a.jpg",
                "http://127.0.0.1:8080/uploads/a.jpg",
                "http://127.0.0.1:8080/images/a.jpg",
                "/placeholder.jpg",
            ]
        );
    }

    #[test]
    fn query_is_dropped_from_derived_candidates() {
        let list = resolve(&reference("x/y/z.jpg?v=2"), &CandidateTemplates::default());
        assert_eq!(list.get(0), Some("x/y/z.jpg?v=2"));
        assert_eq!(list.get(1), Some("/api/images/z.jpg"));
    }

    #[test]
    fn trailing_slashes_on_templates_are_trimmed() {
        let templates = CandidateTemplates::new()
            .with_proxy_prefix("/proxy/")
            .with_remotes("https://cdn.example/u/", "https://cdn.example/i")
            .with_placeholder("/static/none.png");
        let list = resolve(&reference("b.png"), &templates);
        assert_eq!(list.get(1), Some("/proxy/b.png"));
        assert_eq!(list.get(2), Some("https://cdn.example/u/b.png"));
        assert_eq!(list.last(), "/static/none.png");
    }

    #[test]
    fn position_returns_first_match() {
        let list = resolve(&reference("/api/images/a.jpg"), &CandidateTemplates::default());
        assert_eq!(list.position("/api/images/a.jpg"), Some(0));
        assert_eq!(list.position("/nowhere.jpg"), None);
    }

    #[test]
    fn terminal_index() {
        let list = resolve(&reference("a.jpg"), &CandidateTemplates::default());
        assert!(!list.is_terminal(3));
        assert!(list.is_terminal(4));
        assert_eq!(list.len(), 5);
        assert!(!list.is_empty());
    }

    #[test]
    fn templates_deserialize_with_defaults() {
        let templates: CandidateTemplates =
            serde_json::from_str(r#"{"placeholder":"/p.jpg"}"#).unwrap();
        assert_eq!(templates.placeholder, "/p.jpg");
        assert_eq!(templates.proxy_prefix, "/api/images");
    }
}
