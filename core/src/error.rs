//! Error types for the loader.
//!
//! # Design
//! Errors split along the point at which they can occur. `ConfigError` covers
//! everything detectable without touching the network: a bad endpoint, a
//! batch without `create`, or a record that cannot be addressed. These are
//! raised while planning, so a batch that produces one never sends a request.
//! `LoadError` adds the two runtime failures: a completed exchange with a
//! non-2xx status, and a transport that could not produce a response at all.

use thiserror::Error;

use crate::http::{HttpResponse, TransportError};
use crate::types::Phase;

/// Tag carried by failures caused by the caller's configuration or input.
pub const CONFIGURATION_ERROR: &str = "CONFIGURATION_ERROR";

/// Tag carried by completed exchanges whose status code is not 2xx.
pub const STATUS_CODE_ERROR: &str = "STATUS_CODE_ERROR";

/// Tag carried by failures of the underlying transport.
pub const TRANSPORT_ERROR: &str = "TRANSPORT_ERROR";

/// Invalid endpoint configuration or batch input. Never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("host, protocol, and pathname are required (missing `{0}`)")]
    MissingField(&'static str),

    #[error("invalid endpoint url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("endpoint url `{0}` is not an absolute hierarchical url")]
    NotAbsolute(String),

    #[error("port {0} cannot be applied to the endpoint url")]
    InvalidPort(u16),

    #[error("query parameter `{0}` must hold a scalar or a list of scalars")]
    InvalidQueryValue(String),

    #[error("no creation data supplied")]
    MissingCreate,

    /// Update and delete need a configured identifier field.
    #[error("no identifier field configured; update and delete are unavailable")]
    NoIdentifier,

    #[error("record is missing identifier field `{0}`")]
    MissingIdentifierValue(String),

    #[error("identifier field `{0}` must hold a string or a number")]
    InvalidIdentifierValue(String),

    #[error("batch is malformed: {0}")]
    InvalidBatch(#[source] serde_json::Error),

    #[error("record could not be serialized: {0}")]
    Serialization(#[source] serde_json::Error),
}

/// Failure of a whole `load` invocation.
///
/// Results of phases that completed before the failure are discarded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The server answered, but not with a 2xx status.
    #[error("STATUS_CODE_ERROR: {phase} request #{index} returned HTTP {}", .response.status)]
    Status {
        phase: Phase,
        index: usize,
        response: HttpResponse,
    },

    /// The transport failed before a response was obtained.
    #[error("TRANSPORT_ERROR: {phase} request #{index} failed: {source}")]
    Transport {
        phase: Phase,
        index: usize,
        #[source]
        source: TransportError,
    },
}

impl LoadError {
    /// Stable tag distinguishing the three failure kinds.
    pub fn tag(&self) -> &'static str {
        match self {
            LoadError::Config(_) => CONFIGURATION_ERROR,
            LoadError::Status { .. } => STATUS_CODE_ERROR,
            LoadError::Transport { .. } => TRANSPORT_ERROR,
        }
    }

    /// The raw response of a status failure.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            LoadError::Status { response, .. } => Some(response),
            _ => None,
        }
    }

    /// The phase that failed, if the failure happened while sending.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            LoadError::Config(_) => None,
            LoadError::Status { phase, .. } | LoadError::Transport { phase, .. } => Some(*phase),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_exposes_tag_and_response() {
        let err = LoadError::Status {
            phase: Phase::Create,
            index: 1,
            response: HttpResponse {
                status: 500,
                headers: Vec::new(),
                body: "boom".to_string(),
            },
        };
        assert_eq!(err.tag(), STATUS_CODE_ERROR);
        assert_eq!(err.response().map(|r| r.status), Some(500));
        assert_eq!(err.phase(), Some(Phase::Create));
        assert_eq!(
            err.to_string(),
            "STATUS_CODE_ERROR: create request #1 returned HTTP 500"
        );
    }

    #[test]
    fn config_error_converts_into_load_error() {
        let err: LoadError = ConfigError::MissingCreate.into();
        assert_eq!(err.tag(), CONFIGURATION_ERROR);
        assert!(err.response().is_none());
        assert!(err.phase().is_none());
        assert_eq!(err.to_string(), "no creation data supplied");
    }

    #[test]
    fn transport_error_keeps_source() {
        let source: TransportError = "connection refused".into();
        let err = LoadError::Transport {
            phase: Phase::Delete,
            index: 0,
            source,
        };
        assert_eq!(err.tag(), TRANSPORT_ERROR);
        let inner = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(inner.as_deref(), Some("connection refused"));
    }
}
