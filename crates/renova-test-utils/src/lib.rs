//! Testing utilities for Renova workspace
//!
//! Shared test helpers, fixtures, and a scripted upstream.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use async_trait::async_trait;
use renova_proxy::{AppState, ImageUpstream, ProxyConfig, UpstreamError, UpstreamResponse};
use renova_resolver::{CandidateTemplates, ImageResolver};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;
use warp::http::StatusCode;

pub const IMAGE_ORIGIN: &str = "http://files.test:8000";
pub const DATA_ORIGIN: &str = "http://data.test:5005";
pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

/// Upstream answering from a fixed script
///
/// Unscripted URLs answer 404. Every request is recorded in order.
#[derive(Debug, Default)]
pub struct ScriptedUpstream {
    script: Mutex<HashMap<String, Result<UpstreamResponse, UpstreamError>>>,
    calls: Mutex<Vec<Url>>,
}

impl ScriptedUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, response: UpstreamResponse) -> Self {
        self.script.lock().unwrap().insert(normalize(url), Ok(response));
        self
    }

    pub fn image(self, url: &str, bytes: &'static [u8], content_type: &str) -> Self {
        self.respond(
            url,
            UpstreamResponse::new(StatusCode::OK, bytes).with_content_type(content_type),
        )
    }

    pub fn status(self, url: &str, status: StatusCode) -> Self {
        self.respond(url, UpstreamResponse::new(status, ""))
    }

    pub fn json(self, url: &str, body: &serde_json::Value) -> Self {
        self.respond(
            url,
            UpstreamResponse::new(StatusCode::OK, body.to_string())
                .with_content_type("application/json"),
        )
    }

    pub fn unreachable(self, url: &str) -> Self {
        let parsed = Url::parse(url).unwrap();
        self.script
            .lock()
            .unwrap()
            .insert(normalize(url), Err(UpstreamError::transport(parsed, "connection refused")));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(ToString::to_string).collect()
    }
}

fn normalize(url: &str) -> String {
    Url::parse(url).unwrap().to_string()
}

#[async_trait]
impl ImageUpstream for ScriptedUpstream {
    async fn get(&self, url: &Url) -> Result<UpstreamResponse, UpstreamError> {
        self.calls.lock().unwrap().push(url.clone());
        self.script
            .lock()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .unwrap_or_else(|| Ok(UpstreamResponse::new(StatusCode::NOT_FOUND, "")))
    }
}

pub fn test_config() -> ProxyConfig {
    ProxyConfig::new()
        .with_upstream(Url::parse(IMAGE_ORIGIN).unwrap())
        .with_projects_upstream(Url::parse(DATA_ORIGIN).unwrap())
        .with_admin_token(ADMIN_TOKEN)
}

pub fn app_state(upstream: Arc<ScriptedUpstream>) -> AppState {
    app_state_with(&test_config(), upstream)
}

pub fn app_state_with(config: &ProxyConfig, upstream: Arc<ScriptedUpstream>) -> AppState {
    AppState::from_config(config, upstream).unwrap()
}

pub fn isolated_resolver() -> ImageResolver {
    ImageResolver::isolated(CandidateTemplates::default())
}

/// Raw listing as the data backend stores it
pub fn raw_projects() -> serde_json::Value {
    serde_json::json!([
        {
            "id": 1,
            "title": "Porch rebuild",
            "description": "Cedar decking and new railings",
            "location": "Dayton",
            "tags": "[\"exterior\",\"carpentry\"]",
            "images": "[\"porch-before.jpg\",\"porch-after.jpg\"]",
            "serverImagePaths": ["/uploads/porch-after.jpg"],
            "completed_at": "2024-05-01"
        },
        {
            "id": "kitchen-7",
            "title": "Kitchen refit",
            "images": null,
            "tags": []
        }
    ])
}
