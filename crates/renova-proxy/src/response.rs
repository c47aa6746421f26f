//! Mapping proxy and feed outcomes to HTTP responses

use crate::fallback::{ProxyOutcome, DEFAULT_CONTENT_TYPE};
use serde::Serialize;
use warp::http::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use warp::http::StatusCode;
use warp::hyper::Body;
use warp::reply::Response;

/// Cache policy for proxied images; file names are unique, so bytes never change
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Plain-text body for a miss on every upstream subpath
pub const NOT_FOUND_BODY: &str = "Image not found";

/// JSON body returned when the upstream could not be reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchErrorBody {
    /// Fixed summary
    pub error: &'static str,
    /// Transport error message
    pub message: String,
    /// URL being fetched
    pub url: String,
}

/// Build a plain-text response
#[must_use]
pub fn text(status: StatusCode, body: impl Into<String>) -> Response {
    let mut response = Response::new(Body::from(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Build a JSON response
///
/// Falls back to a plain 500 if `value` cannot be serialized.
#[must_use]
pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(bytes) => {
            let mut response = Response::new(Body::from(bytes));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize response body");
            text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

/// Turn a fallback outcome into the image route's response
#[must_use]
pub fn image_response(outcome: ProxyOutcome) -> Response {
    match outcome {
        ProxyOutcome::Found {
            body, content_type, ..
        } => {
            let content_type = HeaderValue::from_str(&content_type)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
            let mut response = Response::new(Body::from(body));
            let headers = response.headers_mut();
            headers.insert(CONTENT_TYPE, content_type);
            headers.insert(CACHE_CONTROL, HeaderValue::from_static(IMMUTABLE_CACHE_CONTROL));
            response
        }
        ProxyOutcome::NotFound { .. } => text(StatusCode::NOT_FOUND, NOT_FOUND_BODY),
        ProxyOutcome::TransportFailed { url, message } => json(
            StatusCode::INTERNAL_SERVER_ERROR,
            &FetchErrorBody {
                error: "Error fetching image",
                message,
                url: url.to_string(),
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;
    use warp::hyper::body::{to_bytes, Bytes};

    async fn body_of(response: Response) -> Bytes {
        to_bytes(response.into_body()).await.unwrap()
    }

    #[tokio::test]
    async fn found_carries_headers() {
        let response = image_response(ProxyOutcome::Found {
            body: Bytes::from_static(b"IMG"),
            content_type: "image/png".into(),
            source: Url::parse("http://u/uploads/a.png").unwrap(),
        });
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "image/png");
        assert_eq!(response.headers()[CACHE_CONTROL], IMMUTABLE_CACHE_CONTROL);
        assert_eq!(&body_of(response).await[..], b"IMG");
    }

    #[tokio::test]
    async fn invalid_content_type_falls_back() {
        let response = image_response(ProxyOutcome::Found {
            body: Bytes::new(),
            content_type: "image/png\n".into(),
            source: Url::parse("http://u/uploads/a.png").unwrap(),
        });
        assert_eq!(response.headers()[CONTENT_TYPE], DEFAULT_CONTENT_TYPE);
    }

    #[tokio::test]
    async fn not_found_is_plain_text() {
        let response = image_response(ProxyOutcome::NotFound { attempted: vec![] });
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(&body_of(response).await[..], NOT_FOUND_BODY.as_bytes());
    }

    #[tokio::test]
    async fn transport_failure_is_json() {
        let response = image_response(ProxyOutcome::TransportFailed {
            url: Url::parse("http://u/uploads/a.png").unwrap(),
            message: "connection refused".into(),
        });
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let value: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(value["error"], "Error fetching image");
        assert_eq!(value["message"], "connection refused");
        assert_eq!(value["url"], "http://u/uploads/a.png");
    }
}
