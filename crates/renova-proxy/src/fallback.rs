//! Upstream fallback chain
//!
//! An image is looked up under each configured subpath of the upstream
//! origin in order (`/uploads/…` then `/images/…` by default). The first
//! 2xx wins. Attempts are strictly sequential and nothing is cached, so a
//! miss is re-tried from the top on the next request.

use crate::error::ConfigError;
use crate::path::ImagePath;
use crate::upstream::ImageUpstream;
use std::sync::Arc;
use url::Url;
use warp::hyper::body::Bytes;

/// Content type assumed when the upstream sends none
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Where and how to look for images upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy {
    /// Upstream origin
    pub upstream_base: Url,
    /// Subpaths tried in order
    pub subpaths: Vec<String>,
    /// Keep going after a transport error instead of failing the request
    pub fallback_on_transport_error: bool,
}

impl FallbackPolicy {
    /// Create policy with default subpaths for `upstream_base`
    #[inline]
    #[must_use]
    pub fn new(upstream_base: Url) -> Self {
        Self {
            upstream_base,
            subpaths: vec!["uploads".to_string(), "images".to_string()],
            fallback_on_transport_error: true,
        }
    }

    /// With subpaths
    #[inline]
    #[must_use]
    pub fn with_subpaths<S: Into<String>>(mut self, subpaths: impl IntoIterator<Item = S>) -> Self {
        self.subpaths = subpaths.into_iter().map(Into::into).collect();
        self
    }

    /// With transport-error behaviour
    #[inline]
    #[must_use]
    pub fn with_transport_fallback(mut self, enabled: bool) -> Self {
        self.fallback_on_transport_error = enabled;
        self
    }

    /// Upstream URL for `path` under `subpath`
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if the joined string is not a URL
    pub fn url_for(&self, subpath: &str, path: &ImagePath) -> Result<Url, ConfigError> {
        let base = self.upstream_base.as_str().trim_end_matches('/');
        let raw = format!("{base}/{}/{}", subpath.trim_matches('/'), path.as_joined());
        Url::parse(&raw).map_err(|e| ConfigError::invalid(format!("bad upstream url {raw}: {e}")))
    }
}

/// Result of running the fallback chain
#[derive(Debug, Clone)]
pub enum ProxyOutcome {
    /// An upstream returned 2xx
    Found {
        /// Image bytes
        body: Bytes,
        /// Upstream content type or [`DEFAULT_CONTENT_TYPE`]
        content_type: String,
        /// URL that served the image
        source: Url,
    },
    /// Every attempt returned non-2xx
    NotFound {
        /// URLs tried, in order
        attempted: Vec<Url>,
    },
    /// No reply could be obtained
    TransportFailed {
        /// URL being fetched when the failure occurred
        url: Url,
        /// Cause
        message: String,
    },
}

impl ProxyOutcome {
    /// Whether an image was found
    #[inline]
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// Image proxy over an upstream origin
pub struct ImageProxy {
    upstream: Arc<dyn ImageUpstream>,
    policy: FallbackPolicy,
}

impl ImageProxy {
    /// Create proxy
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] when the policy has no subpaths
    pub fn new(upstream: Arc<dyn ImageUpstream>, policy: FallbackPolicy) -> Result<Self, ConfigError> {
        if policy.subpaths.is_empty() {
            return Err(ConfigError::invalid("at least one upstream subpath is required"));
        }
        Ok(Self { upstream, policy })
    }

    /// Policy in use
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }

    /// Fetch `path`, walking the subpaths in order
    pub async fn fetch(&self, path: &ImagePath) -> ProxyOutcome {
        tracing::debug!(%path, "attempting to fetch image");

        let mut attempted = Vec::with_capacity(self.policy.subpaths.len());
        let mut last_transport: Option<(Url, String)> = None;

        for (i, subpath) in self.policy.subpaths.iter().enumerate() {
            let url = match self.policy.url_for(subpath, path) {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!(error = %e, "cannot build upstream url");
                    return ProxyOutcome::TransportFailed {
                        url: self.policy.upstream_base.clone(),
                        message: e.to_string(),
                    };
                }
            };
            if i > 0 {
                tracing::info!(%url, "previous source failed, trying next upstream url");
            } else {
                tracing::debug!(%url, "trying first upstream url");
            }

            match self.upstream.get(&url).await {
                Ok(response) if response.is_success() => {
                    let content_type = response
                        .content_type
                        .filter(|ct| !ct.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
                    return ProxyOutcome::Found {
                        body: response.body,
                        content_type,
                        source: url,
                    };
                }
                Ok(response) => {
                    tracing::debug!(%url, status = %response.status, "upstream miss");
                    last_transport = None;
                    attempted.push(url);
                }
                Err(e) => {
                    tracing::warn!(%url, error = %e.message(), "error fetching image");
                    if !self.policy.fallback_on_transport_error {
                        return ProxyOutcome::TransportFailed {
                            url,
                            message: e.message().to_string(),
                        };
                    }
                    last_transport = Some((url.clone(), e.message().to_string()));
                    attempted.push(url);
                }
            }
        }

        match last_transport {
            Some((url, message)) => {
                tracing::error!(%url, %message, "all upstream urls failed, last with a transport error");
                ProxyOutcome::TransportFailed { url, message }
            }
            None => {
                tracing::info!(%path, "all upstream urls failed, returning not found");
                ProxyOutcome::NotFound { attempted }
            }
        }
    }
}
