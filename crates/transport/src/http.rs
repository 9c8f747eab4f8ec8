//! reqwest-backed transport
//!
//! Resolves endpoints against a base URL, applies a per-request timeout, and
//! races the send against the caller's cancellation token. reqwest errors are
//! folded into the four transport outcomes.

use std::time::Duration;

use tracing::{debug, warn};

use crate::{
    Result, Transport, TransportError, TransportFuture, TransportRequest, TransportResponse,
    decode_body,
};

/// HTTP transport over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Build the full URL for an endpoint. Absolute URLs pass through.
    pub fn resolve(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    async fn execute(&self, request: &TransportRequest) -> Result<TransportResponse> {
        let url = self.resolve(&request.endpoint);

        let mut builder = self
            .client
            .request(request.method.into(), &url)
            .headers(request.headers.clone())
            .timeout(self.timeout);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify_send_error)?;
        let status = response.status();

        let bytes = response.bytes().await.map_err(|e| {
            warn!(error = %e, "failed to read response body");
            TransportError::NoResponse(format!("reading response body: {e}"))
        })?;
        let body = decode_body(&bytes);

        debug!(status = status.as_u16(), "response received");
        if status.is_success() {
            Ok(TransportResponse {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(TransportError::Response {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl Transport for ReqwestTransport {
    fn id(&self) -> &str {
        "reqwest"
    }

    fn send<'a>(&'a self, request: &'a TransportRequest) -> TransportFuture<'a> {
        Box::pin(async move {
            let Some(cancel) = &request.cancel else {
                return self.execute(request).await;
            };
            if cancel.is_cancelled() {
                return Err(TransportError::Cancelled);
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(endpoint = %request.endpoint, "request cancelled in flight");
                    Err(TransportError::Cancelled)
                }
                result = self.execute(request) => result,
            }
        })
    }
}

/// Map a reqwest send error onto a transport outcome.
///
/// Builder errors (bad URL, bad header) never reached the network. Everything
/// else means the request was attempted and no response came back.
fn classify_send_error(e: reqwest::Error) -> TransportError {
    if e.is_builder() {
        TransportError::Setup(e.to_string())
    } else if e.is_timeout() {
        TransportError::NoResponse(format!("timed out: {e}"))
    } else {
        TransportError::NoResponse(e.to_string())
    }
}
