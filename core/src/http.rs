//! HTTP request/response types and the transport boundary.
//!
//! # Design
//! Requests and responses are plain data. The loader builds `HttpRequest`
//! values and hands them one at a time to a caller-supplied `Transport`, which
//! is the only place real I/O happens. Connection handling, TLS, redirects and
//! timeouts all belong to the transport; a hung `send` blocks its `load`
//! invocation until the transport gives up.
//!
//! All fields use owned types (`String`, `Vec`) so requests can be moved into
//! blocking or spawned transports without lifetime concerns.

use std::sync::Arc;

use async_trait::async_trait;

/// Error value produced by a transport. Passed through to the caller
/// untouched as the source of `LoadError::Transport`.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// Built by `RequestBuilder`; `url` is absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
///
/// Constructed by the transport after executing an `HttpRequest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// `true` for any status in `200..300`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The sole I/O capability the loader consumes.
///
/// Implementations must report every completed exchange as `Ok`, whatever its
/// status code; status classification is the loader's job. `Err` is reserved
/// for failures that left no response (connection refused, DNS, TLS, ...).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<'a, T: Transport + ?Sized> Transport for &'a T {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    #[test]
    fn success_is_exactly_the_2xx_range() {
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(response(299).is_success());
        assert!(!response(199).is_success());
        assert!(!response(300).is_success());
        assert!(!response(404).is_success());
        assert!(!response(500).is_success());
    }

    #[test]
    fn method_renders_as_wire_name() {
        assert_eq!(HttpMethod::Post.to_string(), "POST");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
    }
}
