//! Renova image proxy
//!
//! Serves portfolio images from an upstream origin, walking a fixed list of
//! subpaths until one answers, and passes the project listing through with
//! its image fields normalized.
//!
//! # Overview
//!
//! - **ImagePath**: validated, traversal-free path captured from the request
//! - **ImageUpstream**: the single seam to the network (reqwest in production)
//! - **ImageProxy**: ordered fallback over upstream subpaths
//! - **ProjectFeed**: admin and public project listings
//! - **routes**: the warp filter tree, CORS on every reply
//!
//! # Example
//!
//! ```rust,no_run
//! use renova_proxy::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ProxyConfig::new();
//! let upstream = Arc::new(HttpUpstream::new(config.upstream_timeout())?);
//! let state = AppState::from_config(&config, upstream)?;
//! renova_proxy::routes::serve(state, config.bind, async {
//!     let _ = tokio::signal::ctrl_c().await;
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod auth;
pub mod config;
pub mod error;
pub mod fallback;
pub mod feed;
pub mod logging;
pub mod path;
pub mod response;
pub mod routes;
pub mod upstream;

// Re-exports
pub use auth::{admin_guard, login_redirect, Unauthorized, LOGIN_PATH};
pub use config::{LogConfig, ProxyConfig};
pub use error::{ConfigError, PathError, UpstreamError};
pub use fallback::{FallbackPolicy, ImageProxy, ProxyOutcome, DEFAULT_CONTENT_TYPE};
pub use feed::{FeedOutcome, ProjectFeed, ADMIN_PROJECTS_PATH, PUBLIC_PROJECTS_PATH};
pub use path::ImagePath;
pub use routes::{cors_headers, routes, AppState};
pub use upstream::{HttpUpstream, ImageUpstream, UpstreamResponse};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running the proxy
    pub use crate::{
        AppState, FallbackPolicy, HttpUpstream, ImagePath, ImageProxy, ImageUpstream,
        ProjectFeed, ProxyConfig, ProxyOutcome, UpstreamResponse,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
