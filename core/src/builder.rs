//! Stateless HTTP request builder.
//!
//! # Design
//! `RequestBuilder` holds only the immutable `EndpointConfig` and carries no
//! mutable state between calls. Each operation maps one record to one
//! `HttpRequest` without touching the network, so every addressing problem
//! (no identifier configured, record without an identifier value) is found
//! before any request leaves the process.

use serde_json::Value;

use crate::endpoint::{url_text, EndpointConfig};
use crate::error::ConfigError;
use crate::http::{HttpMethod, HttpRequest};
use crate::types::{Phase, Record};

/// Kind of request a record turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl From<Phase> for Operation {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Create => Operation::Create,
            Phase::Update => Operation::Update,
            Phase::Delete => Operation::Delete,
        }
    }
}

/// Maps `(Operation, Record)` to an `HttpRequest` against one endpoint.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    endpoint: EndpointConfig,
}

impl RequestBuilder {
    pub fn new(endpoint: EndpointConfig) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    pub fn build(&self, operation: Operation, record: &Record) -> Result<HttpRequest, ConfigError> {
        match operation {
            Operation::Create => self.build_create(record),
            Operation::Update => self.build_update(record),
            Operation::Delete => self.build_delete(record),
        }
    }

    pub fn build_create(&self, record: &Record) -> Result<HttpRequest, ConfigError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint.base_url().to_string(),
            headers: json_headers(),
            body: Some(json_body(record)?),
        })
    }

    pub fn build_update(&self, record: &Record) -> Result<HttpRequest, ConfigError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.record_url(record)?,
            headers: json_headers(),
            body: Some(json_body(record)?),
        })
    }

    pub fn build_delete(&self, record: &Record) -> Result<HttpRequest, ConfigError> {
        Ok(HttpRequest {
            method: HttpMethod::Delete,
            url: self.record_url(record)?,
            headers: Vec::new(),
            body: None,
        })
    }

    fn record_url(&self, record: &Record) -> Result<String, ConfigError> {
        let field = self.endpoint.identifier().ok_or(ConfigError::NoIdentifier)?;
        let missing = || ConfigError::MissingIdentifierValue(field.to_string());
        let invalid = || ConfigError::InvalidIdentifierValue(field.to_string());
        let id = match record.get(field) {
            None | Some(Value::Null) => return Err(missing()),
            Some(Value::String(s)) if s.is_empty() => return Err(missing()),
            Some(value @ (Value::String(_) | Value::Number(_))) => {
                url_text(value).ok_or_else(invalid)?
            }
            Some(_) => return Err(invalid()),
        };
        Ok(self.endpoint.record_url(&id))
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

fn json_body(record: &Record) -> Result<String, ConfigError> {
    serde_json::to_string(record).map_err(ConfigError::Serialization)
}
