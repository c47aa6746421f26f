//! Admin route guard
//!
//! Routes under `/api/admin/` require `Authorization: Bearer <token>`.
//! Unauthenticated requests are sent to the login page with a callback to
//! where they were going.

use sha2::{Digest, Sha256};
use std::sync::Arc;
use warp::http::header::{HeaderValue, LOCATION};
use warp::http::StatusCode;
use warp::hyper::Body;
use warp::reply::Response;
use warp::{Filter, Rejection};

/// Login page unauthenticated admin requests are sent to
pub const LOGIN_PATH: &str = "/admin/login";

/// Rejection raised by [`admin_guard`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unauthorized {
    /// Path and query of the rejected request
    pub callback: String,
}

impl warp::reject::Reject for Unauthorized {}

/// Compare a presented token against the configured one
///
/// Digests are compared in constant time so response timing does not leak
/// how much of the token matched.
#[must_use]
pub fn token_matches(expected: &str, presented: &str) -> bool {
    let a = Sha256::digest(expected.as_bytes());
    let b = Sha256::digest(presented.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Extract the token from an `Authorization` header value
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

/// Filter that passes only requests bearing the admin token
///
/// With no token configured every request is rejected.
pub fn admin_guard(
    token: Option<Arc<str>>,
) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(warp::path::full())
        .and(
            warp::query::raw()
                .or(warp::any().map(String::new))
                .unify(),
        )
        .and_then(
            move |header: Option<String>, path: warp::path::FullPath, query: String| {
                let token = token.clone();
                async move {
                    let authorized = match (token.as_deref(), header.as_deref().and_then(bearer_token)) {
                        (Some(expected), Some(presented)) => token_matches(expected, presented),
                        _ => false,
                    };
                    if authorized {
                        return Ok(());
                    }
                    let callback = if query.is_empty() {
                        path.as_str().to_string()
                    } else {
                        format!("{}?{query}", path.as_str())
                    };
                    tracing::warn!(path = path.as_str(), "unauthenticated admin request");
                    Err(warp::reject::custom(Unauthorized { callback }))
                }
            },
        )
        .untuple_one()
}

/// Redirect to the login page, remembering `callback`
#[must_use]
pub fn login_redirect(callback: &str) -> Response {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("callbackUrl", callback)
        .finish();
    let location = format!("{LOGIN_PATH}?{query}");

    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::FOUND;
    let value = HeaderValue::from_str(&location).unwrap_or(HeaderValue::from_static(LOGIN_PATH));
    response.headers_mut().insert(LOCATION, value);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_comparison() {
        assert!(token_matches("s3cret", "s3cret"));
        assert!(!token_matches("s3cret", "s3cret "));
        assert!(!token_matches("s3cret", ""));
    }

    #[test]
    fn bearer_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[test]
    fn redirect_encodes_callback() {
        let response = login_redirect("/api/admin/projects?page=2");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[LOCATION],
            "/admin/login?callbackUrl=%2Fapi%2Fadmin%2Fprojects%3Fpage%3D2"
        );
    }

    #[tokio::test]
    async fn guard_accepts_matching_token() {
        let filter = admin_guard(Some(Arc::from("tok"))).map(|| "ok");
        let reply = warp::test::request()
            .path("/api/admin/projects")
            .header("authorization", "Bearer tok")
            .filter(&filter)
            .await;
        assert_eq!(reply.unwrap(), "ok");
    }

    #[tokio::test]
    async fn guard_rejects_missing_token() {
        let filter = admin_guard(Some(Arc::from("tok"))).map(|| "ok");
        let rejection = warp::test::request()
            .path("/api/admin/projects?x=1")
            .filter(&filter)
            .await
            .unwrap_err();
        let unauthorized = rejection.find::<Unauthorized>().unwrap();
        assert_eq!(unauthorized.callback, "/api/admin/projects?x=1");
    }

    #[tokio::test]
    async fn guard_rejects_everything_without_configured_token() {
        let filter = admin_guard(None).map(|| "ok");
        let result = warp::test::request()
            .path("/api/admin/projects")
            .header("authorization", "Bearer anything")
            .filter(&filter)
            .await;
        assert!(result.is_err());
    }
}
