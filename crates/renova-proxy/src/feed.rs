//! Project feed passthrough
//!
//! Fetches the project list from the data backend and re-serves it with
//! image and tag fields decoded and every other key untouched. The backend
//! owns the data; nothing here writes.

use crate::error::ConfigError;
use crate::response;
use crate::upstream::ImageUpstream;
use renova_resolver::ProjectRecord;
use serde::Serialize;
use std::sync::Arc;
use url::Url;
use warp::http::StatusCode;
use warp::reply::Response;

/// Upstream path of the authenticated project listing
pub const ADMIN_PROJECTS_PATH: &str = "/api/projects";

/// Upstream path of the public project listing
pub const PUBLIC_PROJECTS_PATH: &str = "/data/projects";

/// Result of fetching a feed
#[derive(Debug, Clone)]
pub enum FeedOutcome {
    /// Projects as received, lists decoded
    Projects(Vec<ProjectRecord>),
    /// Upstream answered non-2xx
    UpstreamStatus(StatusCode),
    /// Transport or decode failure
    Failed(String),
}

#[derive(Serialize)]
struct FeedErrorBody {
    error: &'static str,
}

impl FeedOutcome {
    /// Turn into the feed route's response
    #[must_use]
    pub fn into_response(self) -> Response {
        match self {
            Self::Projects(projects) => response::json(StatusCode::OK, &projects),
            Self::UpstreamStatus(status) => response::text(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("HTTP error! Status: {}", status.as_u16()),
            ),
            Self::Failed(_) => response::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &FeedErrorBody {
                    error: "Failed to fetch projects",
                },
            ),
        }
    }
}

/// One project listing on the data backend
pub struct ProjectFeed {
    upstream: Arc<dyn ImageUpstream>,
    url: Url,
}

impl ProjectFeed {
    /// Create feed for `path` on `base`
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if `base` and `path` do not form a URL
    pub fn new(upstream: Arc<dyn ImageUpstream>, base: &Url, path: &str) -> Result<Self, ConfigError> {
        let raw = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let url = Url::parse(&raw)
            .map_err(|e| ConfigError::invalid(format!("bad feed url {raw}: {e}")))?;
        Ok(Self { upstream, url })
    }

    /// Feed URL
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch and decode the listing
    pub async fn fetch(&self) -> FeedOutcome {
        let response = match self.upstream.get(&self.url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(url = %self.url, error = %e.message(), "error fetching projects");
                return FeedOutcome::Failed(e.to_string());
            }
        };

        if !response.is_success() {
            tracing::warn!(url = %self.url, status = %response.status, "project feed returned error status");
            return FeedOutcome::UpstreamStatus(response.status);
        }

        match serde_json::from_slice::<Vec<ProjectRecord>>(&response.body) {
            Ok(projects) => {
                tracing::debug!(url = %self.url, count = projects.len(), "fetched projects");
                FeedOutcome::Projects(projects)
            }
            Err(e) => {
                tracing::error!(url = %self.url, error = %e, "project feed is not valid JSON");
                FeedOutcome::Failed(e.to_string())
            }
        }
    }
}
