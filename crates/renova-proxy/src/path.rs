//! Proxied image paths
//!
//! Provides [`ImagePath`], the wildcard tail of an image route after it has
//! been checked for traversal. Segments are forwarded to the upstream exactly
//! as received (still percent-encoded); only their shape is validated.

use crate::error::PathError;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Validated, slash-separated path below an upstream subpath
///
/// # Examples
/// - `"abc/def.jpg"` → `["abc", "def.jpg"]`
/// - `"../etc/passwd"` → [`PathError::Traversal`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImagePath(Vec<String>);

impl ImagePath {
    /// Parse and validate a raw wildcard tail
    ///
    /// Leading and trailing slashes are ignored.
    ///
    /// # Errors
    /// Returns [`PathError`] for empty paths, empty segments, dot segments
    /// (plain or encoded), and segments smuggling separators or NUL bytes.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }

        let segments = trimmed
            .split('/')
            .map(|seg| {
                validate_segment(seg)?;
                Ok(seg.to_string())
            })
            .collect::<Result<Vec<_>, PathError>>()?;

        Ok(Self(segments))
    }

    /// Build from pre-split segments
    ///
    /// # Errors
    /// Same rules as [`ImagePath::parse`]
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Result<Self, PathError> {
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        segments
            .iter()
            .map(|seg| {
                let seg = seg.as_ref();
                validate_segment(seg)?;
                Ok(seg.to_string())
            })
            .collect::<Result<Vec<_>, PathError>>()
            .map(Self)
    }

    /// Path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Final segment (the file name)
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    /// Segments joined with `/`
    #[inline]
    #[must_use]
    pub fn as_joined(&self) -> String {
        self.0.join("/")
    }
}

/// Lowercased substrings that may not appear in any segment
const FORBIDDEN: [&str; 4] = ["%2f", "%5c", "%00", "\\"];

fn validate_segment(seg: &str) -> Result<(), PathError> {
    if seg.is_empty() {
        return Err(PathError::EmptySegment);
    }

    let lowered = seg.to_ascii_lowercase();
    let decoded_dots = lowered.replace("%2e", ".");
    if decoded_dots == "." || decoded_dots == ".." {
        return Err(PathError::Traversal(seg.to_string()));
    }

    if seg.contains('\0') || FORBIDDEN.iter().any(|bad| lowered.contains(bad)) {
        return Err(PathError::InvalidSegment(seg.to_string()));
    }

    Ok(())
}

impl Display for ImagePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_joined())
    }
}

impl FromStr for ImagePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_path() {
        let path = ImagePath::parse("abc/def.jpg").unwrap();
        assert_eq!(path.segments(), &["abc", "def.jpg"]);
        assert_eq!(path.file_name(), "def.jpg");
        assert_eq!(path.to_string(), "abc/def.jpg");
    }

    #[test]
    fn surrounding_slashes_ignored() {
        let path: ImagePath = "/foo.jpg/".parse().unwrap();
        assert_eq!(path.segments(), &["foo.jpg"]);
    }

    #[test]
    fn encoded_names_pass_through() {
        let path = ImagePath::parse("my%20kitchen.jpg").unwrap();
        assert_eq!(path.as_joined(), "my%20kitchen.jpg");
    }

    #[test]
    fn dots_inside_names_are_fine() {
        assert!(ImagePath::parse("v1..2/a..b.jpg").is_ok());
        assert!(ImagePath::parse(".hidden.jpg").is_ok());
    }

    #[test]
    fn empty_rejected() {
        assert_eq!(ImagePath::parse(""), Err(PathError::Empty));
        assert_eq!(ImagePath::parse("///"), Err(PathError::Empty));
        let none: [&str; 0] = [];
        assert_eq!(ImagePath::from_segments(&none), Err(PathError::Empty));
    }

    #[test]
    fn empty_segment_rejected() {
        assert_eq!(ImagePath::parse("a//b.jpg"), Err(PathError::EmptySegment));
    }

    #[test]
    fn traversal_rejected() {
        for raw in ["../secret", "a/../../b", "./a.jpg", "%2e%2e/x", "a/%2E%2e/b", ".%2E/y"] {
            assert!(
                matches!(ImagePath::parse(raw), Err(PathError::Traversal(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn smuggled_separators_rejected() {
        for raw in ["a%2fb.jpg", "a%5Cb.jpg", "a\\b.jpg", "a%00.jpg"] {
            assert!(
                matches!(ImagePath::parse(raw), Err(PathError::InvalidSegment(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn from_segments_validates() {
        let path = ImagePath::from_segments(&["abc", "def.jpg"]).unwrap();
        assert_eq!(path.as_joined(), "abc/def.jpg");
        assert!(ImagePath::from_segments(&["abc", ".."]).is_err());
    }
}
