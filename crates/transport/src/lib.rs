//! Transport abstraction for the authenticated request layer
//!
//! Defines the `Transport` trait that decouples the request pipeline from the
//! HTTP client doing the I/O. `ReqwestTransport` is the production
//! implementation; tests substitute scripted transports behind the same
//! trait.
//!
//! A transport reports exactly one of four outcomes per request: a 2xx
//! response, a non-2xx response (with its body), no response at all, or a
//! failure to build/send the request. Cancellation is a fifth, caller-driven
//! outcome. The pipeline classifies on these and nothing else.

pub mod http;

pub use http::ReqwestTransport;
pub use tokio_util::sync::CancellationToken;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// HTTP method of an outgoing request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Parse a method name, ignoring case.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A request as handed to the transport.
///
/// `endpoint` is either a path resolved against the transport's base URL or
/// an absolute `http(s)://` URL.
#[derive(Debug, Clone, Default)]
pub struct TransportRequest {
    pub endpoint: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    pub cancel: Option<CancellationToken>,
}

impl TransportRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            ..Default::default()
        }
    }

    /// Whether the caller cancelled this request.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }
}

/// A 2xx response with its decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

/// Failed transport outcomes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The caller cancelled the request before it completed
    #[error("request cancelled")]
    Cancelled,

    /// The server answered outside 2xx
    #[error("server responded with status {status}")]
    Response { status: u16, body: Value },

    /// The request left the client but nothing usable came back
    /// (connect failure, timeout, truncated body)
    #[error("no response received: {0}")]
    NoResponse(String),

    /// The request could not be built or sent at all
    #[error("request setup failed: {0}")]
    Setup(String),
}

impl TransportError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransportError::Cancelled)
    }
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Boxed future returned by `Transport::send`.
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<TransportResponse>> + Send + 'a>>;

/// Abstraction over the HTTP client that performs the network I/O.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn Transport>`).
pub trait Transport: Send + Sync {
    /// Identifier for logging (e.g. "reqwest")
    fn id(&self) -> &str;

    /// Issue the request. Non-2xx answers are `TransportError::Response`.
    fn send<'a>(&'a self, request: &'a TransportRequest) -> TransportFuture<'a>;
}

/// Decode a response body: empty is `null`, JSON is parsed, anything else is
/// kept as a string.
pub fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
