//! Portfolio project records
//!
//! Projects are owned by the external backend. Two views exist:
//!
//! - [`ProjectRecord`]: the object exactly as sent, with only `images` and
//!   `tags` decoded. Feeds re-serve this, so unknown keys and the backend's
//!   own key spellings survive.
//! - [`Project`]: the typed view the resolver reads image references from.
//!
//! The backend is inconsistent about shapes: ids arrive as numbers or
//! strings, and `images`/`tags` sometimes arrive as a JSON array encoded
//! inside a string.

use crate::error::ResolveError;
use crate::reference::ImageReference;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};

/// Project identifier as sent by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectId {
    /// Numeric id (data API)
    Number(i64),
    /// String id (public feed)
    Text(String),
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::Number(0)
    }
}

impl Display for ProjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Portfolio project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Backend identifier
    #[serde(default)]
    pub id: ProjectId,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Site location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Category tags
    #[serde(default, deserialize_with = "tags_field")]
    pub tags: Vec<String>,
    /// Already-usable image URLs
    #[serde(default, deserialize_with = "images_field")]
    pub images: Vec<String>,
    /// Paths relative to the image proxy route
    #[serde(
        default,
        rename = "serverImagePaths",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub server_image_paths: Vec<String>,
    /// Completion date, kept in the backend's own format
    #[serde(
        default,
        alias = "completedAt",
        alias = "dateCompleted",
        alias = "completion_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<String>,
}

impl Project {
    /// Every image of this project as a reference
    ///
    /// `images` come first as given, then each server path prefixed with
    /// `proxy_prefix`. Blank entries are skipped.
    #[must_use]
    pub fn image_references(&self, proxy_prefix: &str) -> Vec<ImageReference> {
        let prefix = proxy_prefix.trim_end_matches('/');
        let direct = self
            .images
            .iter()
            .filter(|raw| !raw.trim().is_empty())
            .filter_map(|raw| ImageReference::new(raw.as_str()).ok());
        let proxied = self
            .server_image_paths
            .iter()
            .map(|path| path.trim_start_matches('/'))
            .filter(|path| !path.trim().is_empty())
            .filter_map(|path| ImageReference::new(format!("{prefix}/{path}")).ok());
        direct.chain(proxied).collect()
    }

    /// First image, used for cards and thumbnails
    #[must_use]
    pub fn cover_image(&self, proxy_prefix: &str) -> Option<ImageReference> {
        self.image_references(proxy_prefix).into_iter().next()
    }
}

/// Project object as received from the backend
///
/// `images` and `tags` holding an encoded string (or `null`) are replaced by
/// the decoded list. Every other key is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProjectRecord(Map<String, Value>);

impl ProjectRecord {
    /// Normalize one backend object
    ///
    /// # Errors
    /// Returns [`ResolveError::MalformedField`] if `value` is not an object or
    /// an encoded list does not parse
    pub fn from_value(value: Value) -> Result<Self, ResolveError> {
        let Value::Object(mut fields) = value else {
            return Err(ResolveError::malformed("project", "expected a JSON object"));
        };
        for field in ["images", "tags"] {
            if let Some(slot) = fields.get_mut(field) {
                normalize_list(field, slot)?;
            }
        }
        Ok(Self(fields))
    }

    /// All keys as received
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Value under `key`
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Typed view of this record
    ///
    /// # Errors
    /// Returns [`ResolveError::MalformedField`] if a known field has the wrong type
    pub fn project(&self) -> Result<Project, ResolveError> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| ResolveError::malformed("project", e.to_string()))
    }
}

impl<'de> Deserialize<'de> for ProjectRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}

fn normalize_list(field: &'static str, slot: &mut Value) -> Result<(), ResolveError> {
    let decoded = match slot {
        Value::Null => Vec::new(),
        Value::String(encoded) => {
            decode_list(field, Some(ListOrEncoded::Encoded(std::mem::take(encoded))))?
        }
        _ => return Ok(()),
    };
    *slot = Value::Array(decoded.into_iter().map(Value::String).collect());
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrEncoded {
    List(Vec<String>),
    Encoded(String),
}

fn decode_list(field: &'static str, value: Option<ListOrEncoded>) -> Result<Vec<String>, ResolveError> {
    match value {
        None => Ok(Vec::new()),
        Some(ListOrEncoded::List(list)) => Ok(list),
        Some(ListOrEncoded::Encoded(s)) if s.trim().is_empty() => Ok(Vec::new()),
        Some(ListOrEncoded::Encoded(s)) => serde_json::from_str::<Option<Vec<String>>>(&s)
            .map(Option::unwrap_or_default)
            .map_err(|e| ResolveError::malformed(field, e.to_string())),
    }
}

fn images_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Option::<ListOrEncoded>::deserialize(deserializer)?;
    decode_list("images", value).map_err(D::Error::custom)
}

fn tags_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Option::<ListOrEncoded>::deserialize(deserializer)?;
    decode_list("tags", value).map_err(D::Error::custom)
}
