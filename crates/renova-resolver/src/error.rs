//! Error types for image resolution

/// Errors raised while building references or reading project records
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Reference was the empty string
    #[error("image reference must not be empty")]
    EmptyReference,

    /// A project field had an unexpected shape
    #[error("malformed field '{field}': {message}")]
    MalformedField {
        /// Field name as it appears upstream
        field: &'static str,
        /// Parser message
        message: String,
    },
}

impl ResolveError {
    /// Create malformed field error
    pub fn malformed(field: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedField {
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reference_display() {
        assert_eq!(
            ResolveError::EmptyReference.to_string(),
            "image reference must not be empty"
        );
    }

    #[test]
    fn malformed_field_display() {
        let err = ResolveError::malformed("images", "expected array");
        assert_eq!(err.to_string(), "malformed field 'images': expected array");
    }
}
