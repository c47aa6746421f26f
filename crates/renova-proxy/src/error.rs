//! Error types for the image proxy
//!
//! Request handling never surfaces these as panics: the route layer turns
//! every failure into an HTTP response. Configuration and startup return
//! them directly.

use std::path::PathBuf;
use url::Url;

/// Rejected proxied path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Nothing left after trimming slashes
    #[error("image path is empty")]
    Empty,

    /// `a//b`
    #[error("image path contains an empty segment")]
    EmptySegment,

    /// `.` or `..`, plain or percent-encoded
    #[error("image path segment '{0}' would traverse directories")]
    Traversal(String),

    /// Encoded separator, backslash, or NUL
    #[error("invalid image path segment: '{0}'")]
    InvalidSegment(String),
}

/// Failure talking to an upstream origin (not a non-2xx reply)
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    /// DNS, connect, timeout, or body read failure
    #[error("transport error fetching {url}: {message}")]
    Transport {
        /// URL being fetched
        url: Url,
        /// Client error text
        message: String,
    },
}

impl UpstreamError {
    /// Create transport error for url
    pub fn transport(url: Url, message: impl Into<String>) -> Self {
        Self::Transport {
            url,
            message: message.into(),
        }
    }

    /// URL that was being fetched
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        match self {
            Self::Transport { url, .. } => url,
        }
    }

    /// Human-readable cause
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message, .. } => message,
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("io error reading {path}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or type error
    #[error("invalid config file {path}: {source}")]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// TOML decoder error
        #[source]
        source: toml::de::Error,
    },

    /// Value failed validation
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// HTTP client could not be built
    #[error("http client error: {0}")]
    Client(String),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create validation error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}
