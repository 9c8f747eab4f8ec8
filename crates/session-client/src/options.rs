//! Caller request options and the per-call descriptor
//!
//! Only six option names are recognized. Anything else a caller passes in a
//! JSON configuration is dropped here and never reaches the transport.

use serde::Deserialize;
use serde_json::Value;
use transport::{CancellationToken, Method};

/// The whitelisted request configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    pub endpoint: String,
    #[serde(default)]
    pub method: Method,
    #[serde(default)]
    pub body: Option<Value>,
    /// Not representable in JSON; set through `with_cancel`
    #[serde(skip)]
    pub cancel_token: Option<CancellationToken>,
    #[serde(default)]
    pub without_auth: bool,
    #[serde(default)]
    pub disable_error_notification: bool,
}

impl RequestOptions {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            ..Default::default()
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Get, endpoint)
    }

    pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, endpoint).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Skip the token check and send no auth header.
    pub fn without_auth(mut self) -> Self {
        self.without_auth = true;
        self
    }

    /// Suppress the business-failure notification for this call.
    pub fn disable_error_notification(mut self) -> Self {
        self.disable_error_notification = true;
        self
    }

    /// Pick the recognized options out of an arbitrary JSON configuration.
    ///
    /// Unknown keys are ignored. A recognized key with the wrong type, or a
    /// missing `endpoint`, is an error.
    pub fn from_value(config: Value) -> serde_json::Result<Self> {
        serde_json::from_value(config)
    }
}

/// Options plus the state the pipeline keeps for one call.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub options: RequestOptions,
    /// Set once, right before the single replay after a refresh
    pub retried: bool,
    /// Access token the latest attempt carried, or the expired one that
    /// stopped it in pre-flight
    pub token: Option<String>,
}

impl RequestDescriptor {
    pub fn new(options: RequestOptions) -> Self {
        Self {
            options,
            retried: false,
            token: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.options
            .cancel_token
            .as_ref()
            .is_some_and(|t| t.is_cancelled())
    }
}
