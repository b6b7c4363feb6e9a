//! Endpoint configuration.
//!
//! # Design
//! An endpoint is described either by a ready-made absolute URL or by its
//! parts (`protocol`, `host`, `port`, `pathname`, `query`). Both collapse into
//! one immutable `EndpointConfig` holding a parsed `url::Url`. Whether update
//! and delete are available depends only on `identifier` being set, so the
//! two construction paths differ in input shape, not in capability.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::ConfigError;

/// Structured endpoint description, as found in configuration files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub protocol: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub pathname: Option<String>,
    /// Scalar values are stringified; an array repeats its key once per
    /// element.
    pub query: Option<BTreeMap<String, Value>>,
    pub identifier: Option<String>,
}

/// Either form accepted in configuration: `"http://host/path"` or a
/// descriptor object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EndpointSource {
    Url(String),
    Descriptor(EndpointDescriptor),
}

/// Immutable target of every request issued by a loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    base_url: Url,
    identifier: Option<String>,
}

impl EndpointConfig {
    /// Parse a pre-built absolute URL. No identifier is configured; call
    /// `with_identifier` to enable update and delete.
    pub fn from_url(raw: &str) -> Result<Self, ConfigError> {
        let base_url = parse_absolute(raw)?;
        Ok(Self {
            base_url,
            identifier: None,
        })
    }

    pub fn from_descriptor(descriptor: EndpointDescriptor) -> Result<Self, ConfigError> {
        let protocol = required(descriptor.protocol, "protocol")?;
        let host = required(descriptor.host, "host")?;
        let pathname = required(descriptor.pathname, "pathname")?;

        let scheme = protocol.trim_end_matches(':');
        let mut base_url = parse_absolute(&format!("{scheme}://{host}"))?;
        if let Some(port) = descriptor.port {
            base_url
                .set_port(Some(port))
                .map_err(|()| ConfigError::InvalidPort(port))?;
        }
        base_url.set_path(&pathname);
        if let Some(query) = descriptor.query.filter(|q| !q.is_empty()) {
            let pairs = query_pairs(&query)?;
            base_url.query_pairs_mut().extend_pairs(pairs);
        }

        Ok(Self {
            base_url,
            identifier: descriptor.identifier.filter(|id| !id.is_empty()),
        })
    }

    pub fn from_source(source: EndpointSource) -> Result<Self, ConfigError> {
        match source {
            EndpointSource::Url(raw) => Self::from_url(&raw),
            EndpointSource::Descriptor(descriptor) => Self::from_descriptor(descriptor),
        }
    }

    /// Name the record field whose value addresses a record for update and
    /// delete.
    pub fn with_identifier(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.identifier = (!field.is_empty()).then_some(field);
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Base URL with `id` appended as one percent-encoded path segment. Any
    /// configured query string stays at the end.
    pub fn record_url(&self, id: &str) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id);
        }
        url.into()
    }
}

impl TryFrom<EndpointDescriptor> for EndpointConfig {
    type Error = ConfigError;

    fn try_from(descriptor: EndpointDescriptor) -> Result<Self, Self::Error> {
        Self::from_descriptor(descriptor)
    }
}

impl TryFrom<EndpointSource> for EndpointConfig {
    type Error = ConfigError;

    fn try_from(source: EndpointSource) -> Result<Self, Self::Error> {
        Self::from_source(source)
    }
}

/// Text of a JSON scalar as it appears in a URL. Whole-number floats lose
/// their fractional part (`1.0` -> `1`).
pub(crate) fn url_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                (f as i64).to_string()
            }
            _ => n.to_string(),
        }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn query_pairs(query: &BTreeMap<String, Value>) -> Result<Vec<(&str, String)>, ConfigError> {
    let mut pairs = Vec::new();
    for (key, value) in query {
        let invalid = || ConfigError::InvalidQueryValue(key.clone());
        match value {
            Value::Array(items) => {
                for item in items {
                    pairs.push((key.as_str(), url_text(item).ok_or_else(invalid)?));
                }
            }
            Value::Null => pairs.push((key.as_str(), String::new())),
            other => pairs.push((key.as_str(), url_text(other).ok_or_else(invalid)?)),
        }
    }
    Ok(pairs)
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingField(field))
}

fn parse_absolute(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::NotAbsolute(raw.to_string()));
    }
    Ok(url)
}
