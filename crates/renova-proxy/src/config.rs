//! Proxy configuration
//!
//! Defaults, then an optional TOML file, then CLI flags / environment
//! variables (applied by the binary through the `with_*` builders).
//!
//! ```toml
//! bind = "0.0.0.0:3000"
//! upstream_base = "http://files.internal:8000"
//! upstream_subpaths = ["uploads", "images"]
//! fallback_on_transport_error = true
//!
//! [log]
//! filter = "renova_proxy=debug,info"
//!
//! [candidates]
//! proxy_prefix = "/api/images"
//! ```

use crate::error::ConfigError;
use crate::fallback::FallbackPolicy;
use renova_resolver::CandidateTemplates;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Proxy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listen address
    pub bind: SocketAddr,
    /// Image origin
    pub upstream_base: Url,
    /// Project data backend
    pub projects_base: Url,
    /// Subpaths of `upstream_base` tried in order
    pub upstream_subpaths: Vec<String>,
    /// Try the next subpath after a transport error
    pub fallback_on_transport_error: bool,
    /// Per-request upstream timeout
    pub upstream_timeout_secs: u64,
    /// Bearer token for `/api/admin/` routes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_token: Option<String>,
    /// File served at `/placeholder.jpg`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder_file: Option<PathBuf>,
    /// Logging
    pub log: LogConfig,
    /// Resolver templates (used by the `candidates` command)
    pub candidates: CandidateTemplates,
}

impl ProxyConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file; absent keys keep their defaults
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns the TOML error on malformed input
    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// With listen address
    #[inline]
    #[must_use]
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// With image origin
    #[inline]
    #[must_use]
    pub fn with_upstream(mut self, base: Url) -> Self {
        self.upstream_base = base;
        self
    }

    /// With project data backend
    #[inline]
    #[must_use]
    pub fn with_projects_upstream(mut self, base: Url) -> Self {
        self.projects_base = base;
        self
    }

    /// With admin token
    #[inline]
    #[must_use]
    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    /// With placeholder file
    #[inline]
    #[must_use]
    pub fn with_placeholder_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.placeholder_file = Some(path.into());
        self
    }

    /// With transport-error fallback behaviour
    #[inline]
    #[must_use]
    pub fn with_transport_fallback(mut self, enabled: bool) -> Self {
        self.fallback_on_transport_error = enabled;
        self
    }

    /// With upstream timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.upstream_timeout_secs = secs;
        self
    }

    /// With log filter
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log.filter = filter.into();
        self
    }

    /// With JSON log output
    #[inline]
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.log.json = json;
        self
    }

    /// Upstream timeout as a duration
    #[inline]
    #[must_use]
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Fallback policy derived from this configuration
    #[must_use]
    pub fn fallback_policy(&self) -> FallbackPolicy {
        FallbackPolicy::new(self.upstream_base.clone())
            .with_subpaths(self.upstream_subpaths.iter().cloned())
            .with_transport_fallback(self.fallback_on_transport_error)
    }

    /// Check values the types cannot express
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] describing the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream_subpaths.is_empty() {
            return Err(ConfigError::invalid("upstream_subpaths must not be empty"));
        }
        for subpath in &self.upstream_subpaths {
            let trimmed = subpath.trim_matches('/');
            if trimmed.is_empty() || trimmed.contains('/') || trimmed.contains("..") {
                return Err(ConfigError::invalid(format!(
                    "upstream subpath '{subpath}' must be a single path segment"
                )));
            }
        }
        if self.upstream_timeout_secs == 0 {
            return Err(ConfigError::invalid("upstream_timeout_secs must be greater than zero"));
        }
        for (name, url) in [("upstream_base", &self.upstream_base), ("projects_base", &self.projects_base)] {
            if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::invalid(format!("{name} must be an http(s) base url, got {url}")));
            }
        }
        if matches!(self.admin_token.as_deref(), Some(t) if t.trim().is_empty()) {
            return Err(ConfigError::invalid("admin_token must not be blank"));
        }
        Ok(())
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            upstream_base: default_url("http://127.0.0.1:8000"),
            projects_base: default_url("http://127.0.0.1:5005"),
            upstream_subpaths: vec!["uploads".to_string(), "images".to_string()],
            fallback_on_transport_error: true,
            upstream_timeout_secs: 30,
            admin_token: None,
            placeholder_file: None,
            log: LogConfig::default(),
            candidates: CandidateTemplates::default(),
        }
    }
}

fn default_url(raw: &'static str) -> Url {
    // Only called with literals above.
    Url::parse(raw).expect("default url literal is valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ProxyConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.upstream_subpaths, vec!["uploads", "images"]);
        assert!(config.fallback_on_transport_error);
        assert_eq!(config.upstream_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ProxyConfig::from_toml(
            r#"
            upstream_base = "http://files.internal:8000"
            fallback_on_transport_error = false

            [log]
            json = true
            "#,
        )
        .unwrap();
        assert_eq!(config.upstream_base.as_str(), "http://files.internal:8000/");
        assert!(!config.fallback_on_transport_error);
        assert!(config.log.json);
        assert_eq!(config.log.filter, "info");
        assert_eq!(config.bind, ProxyConfig::default().bind);
    }

    #[test]
    fn candidates_table() {
        let config = ProxyConfig::from_toml(
            r#"
            [candidates]
            remote_primary = "https://cdn.example/uploads"
            "#,
        )
        .unwrap();
        assert_eq!(config.candidates.remote_primary, "https://cdn.example/uploads");
        assert_eq!(config.candidates.placeholder, "/placeholder.jpg");
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind = \"0.0.0.0:8080\"\nadmin_token = \"abc\"").unwrap();
        let config = ProxyConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.admin_token.as_deref(), Some("abc"));
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let result = ProxyConfig::from_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn from_file_bad_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind = 42").unwrap();
        let result = ProxyConfig::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = ProxyConfig::new();
        config.upstream_subpaths.clear();
        assert!(config.validate().is_err());

        let mut config = ProxyConfig::new();
        config.upstream_subpaths = vec!["../etc".to_string()];
        assert!(config.validate().is_err());

        assert!(ProxyConfig::new().with_timeout_secs(0).validate().is_err());
        assert!(ProxyConfig::new().with_admin_token(" ").validate().is_err());

        let ftp = Url::parse("ftp://files.internal/").unwrap();
        assert!(ProxyConfig::new().with_upstream(ftp).validate().is_err());
    }

    #[test]
    fn fallback_policy_mirrors_config() {
        let policy = ProxyConfig::new().with_transport_fallback(false).fallback_policy();
        assert!(!policy.fallback_on_transport_error);
        assert_eq!(policy.subpaths, vec!["uploads", "images"]);
    }
}
