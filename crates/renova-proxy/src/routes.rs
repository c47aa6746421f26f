//! HTTP surface
//!
//! # Routes (in match order)
//!
//! | Method  | Path                  | Handler                              |
//! |---------|-----------------------|--------------------------------------|
//! | OPTIONS | any                   | CORS preflight, 204                  |
//! | GET     | `/api/admin/projects` | admin guard → admin project feed     |
//! | GET     | `/api/projects`       | public project feed                  |
//! | GET     | `/api/images/{..}`    | image proxy                          |
//! | GET     | `/api/{..}`           | image proxy (catch-all variant)      |
//! | GET     | `/placeholder.jpg`    | static placeholder, when configured  |
//!
//! Every reply, including recovered rejections, carries the CORS headers.

use crate::auth::{admin_guard, login_redirect, Unauthorized};
use crate::config::ProxyConfig;
use crate::error::ConfigError;
use crate::fallback::ImageProxy;
use crate::feed::{ProjectFeed, ADMIN_PROJECTS_PATH, PUBLIC_PROJECTS_PATH};
use crate::path::ImagePath;
use crate::response::{image_response, text};
use crate::upstream::ImageUpstream;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use warp::http::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
};
use warp::http::{Method, StatusCode};
use warp::hyper::Body;
use warp::path::Tail;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

const ALLOW_METHODS: &str = "GET,OPTIONS,PATCH,DELETE,POST,PUT";
const ALLOW_HEADERS: &str = "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, \
     Content-Length, Content-MD5, Content-Type, Date, X-Api-Version";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// Image proxy
    pub images: Arc<ImageProxy>,
    /// Authenticated project listing
    pub admin_feed: Arc<ProjectFeed>,
    /// Public project listing
    pub public_feed: Arc<ProjectFeed>,
    /// Token required by admin routes
    pub admin_token: Option<Arc<str>>,
    /// File served at `/placeholder.jpg`
    pub placeholder_file: Option<Arc<PathBuf>>,
}

impl AppState {
    /// Build state for `config` over `upstream`
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the configuration is invalid
    pub fn from_config(
        config: &ProxyConfig,
        upstream: Arc<dyn ImageUpstream>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let images = ImageProxy::new(upstream.clone(), config.fallback_policy())?;
        let admin_feed = ProjectFeed::new(upstream.clone(), &config.projects_base, ADMIN_PROJECTS_PATH)?;
        let public_feed = ProjectFeed::new(upstream, &config.projects_base, PUBLIC_PROJECTS_PATH)?;
        Ok(Self {
            images: Arc::new(images),
            admin_feed: Arc::new(admin_feed),
            public_feed: Arc::new(public_feed),
            admin_token: config.admin_token.as_deref().map(Arc::from),
            placeholder_file: config.placeholder_file.clone().map(Arc::new),
        })
    }
}

/// Headers added to every reply
#[must_use]
pub fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
    headers
}

fn with_state<T: Clone + Send + Sync>(value: T) -> impl Filter<Extract = (T,), Error = Infallible> + Clone {
    warp::any().map(move || value.clone())
}

/// Complete filter tree
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    // Non-OPTIONS requests fall through as not-found so they never mask a 404.
    let preflight = warp::method()
        .and_then(|method: Method| async move {
            if method == Method::OPTIONS {
                Ok(())
            } else {
                Err(warp::reject::not_found())
            }
        })
        .untuple_one()
        .map(|| {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::NO_CONTENT;
            response
        });

    let admin_projects = warp::get()
        .and(warp::path!("api" / "admin" / "projects"))
        .and(admin_guard(state.admin_token.clone()))
        .and(with_state(state.admin_feed.clone()))
        .then(serve_feed);

    // Everything else under /api/admin/ needs the guard too, then 404s.
    let admin_other = warp::path("api")
        .and(warp::path("admin"))
        .and(admin_guard(state.admin_token.clone()))
        .and_then(|| async { Err::<Response, Rejection>(warp::reject::not_found()) });

    let public_projects = warp::get()
        .and(warp::path!("api" / "projects"))
        .and(with_state(state.public_feed.clone()))
        .then(serve_feed);

    let images = warp::get()
        .and(warp::path("api"))
        .and(warp::path("images"))
        .and(warp::path::tail())
        .and(with_state(state.images.clone()))
        .then(proxy_image);

    let api_fallback = warp::get()
        .and(warp::path("api"))
        .and(warp::path::tail())
        .and(with_state(state.images.clone()))
        .and_then(proxy_api_fallback);

    let placeholder = warp::get()
        .and(warp::path!("placeholder.jpg"))
        .and(with_state(state.placeholder_file.clone()))
        .and_then(serve_placeholder);

    preflight
        .or(admin_projects)
        .unify()
        .or(admin_other)
        .unify()
        .or(public_projects)
        .unify()
        .or(images)
        .unify()
        .or(api_fallback)
        .unify()
        .or(placeholder)
        .unify()
        .recover(handle_rejection)
        .unify()
        .with(warp::reply::with::headers(cors_headers()))
        .with(warp::trace::request())
}

async fn serve_feed(feed: Arc<ProjectFeed>) -> Response {
    feed.fetch().await.into_response()
}

async fn proxy_image(tail: Tail, proxy: Arc<ImageProxy>) -> Response {
    match ImagePath::parse(tail.as_str()) {
        Ok(path) => image_response(proxy.fetch(&path).await),
        Err(e) => {
            tracing::warn!(path = tail.as_str(), error = %e, "rejected image path");
            text(StatusCode::BAD_REQUEST, "Invalid image path")
        }
    }
}

async fn proxy_api_fallback(tail: Tail, proxy: Arc<ImageProxy>) -> Result<Response, Rejection> {
    if tail.as_str().split('/').next() == Some("admin") {
        return Err(warp::reject::not_found());
    }
    Ok(proxy_image(tail, proxy).await)
}

async fn serve_placeholder(file: Option<Arc<PathBuf>>) -> Result<Response, Rejection> {
    let Some(file) = file else {
        return Err(warp::reject::not_found());
    };
    match tokio::fs::read(file.as_path()).await {
        Ok(bytes) => {
            let mut response = Response::new(Body::from(bytes));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(placeholder_content_type(&file)));
            Ok(response)
        }
        Err(e) => {
            tracing::error!(path = %file.display(), error = %e, "cannot read placeholder file");
            Err(warp::reject::not_found())
        }
    }
}

fn placeholder_content_type(file: &std::path::Path) -> &'static str {
    match file
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    if let Some(unauthorized) = err.find::<Unauthorized>() {
        return Ok(login_redirect(&unauthorized.callback));
    }
    if err.is_not_found() {
        return Ok(text(StatusCode::NOT_FOUND, "Not found"));
    }
    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(text(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"));
    }
    tracing::error!(rejection = ?err, "unhandled rejection");
    Ok(text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"))
}

/// Bind and serve until `shutdown` resolves
///
/// # Errors
/// Returns the bind error if `addr` is unavailable
pub async fn serve(
    state: AppState,
    addr: SocketAddr,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), warp::Error> {
    let (bound, server) =
        warp::serve(routes(state)).try_bind_with_graceful_shutdown(addr, shutdown)?;
    tracing::info!(%bound, "image proxy listening");
    server.await;
    tracing::info!("image proxy stopped");
    Ok(())
}
