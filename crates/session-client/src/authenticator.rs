//! Pre-flight authentication
//!
//! Runs before every send and is the only place a doomed request can be
//! stopped before it reaches the network. No I/O besides the token read.

use reqwest::header::{HeaderName, HeaderValue};
use session_store::{ACCESS_TOKEN_HEADER, TokenStore};
use tracing::debug;
use transport::TransportRequest;

use crate::options::RequestDescriptor;

/// Why a request was stopped before sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No token record stored
    NoToken,
    /// Stored token already expired
    TokenExpired,
    /// Stored token cannot be encoded as a header value
    InvalidToken(String),
}

/// Build the transport request for one attempt, attaching the access token.
///
/// `without_auth` requests skip the store entirely and carry no auth header.
/// Otherwise the token read for this attempt is recorded on the descriptor,
/// including an expired one that stops the request here.
pub async fn authorize(
    store: &TokenStore,
    descriptor: &mut RequestDescriptor,
) -> Result<TransportRequest, Rejection> {
    descriptor.token = None;
    let options = &descriptor.options;
    let mut request = TransportRequest::new(options.method, options.endpoint.clone());
    request.body = options.body.clone();
    request.cancel = options.cancel_token.clone();

    if options.without_auth {
        return Ok(request);
    }

    let Some(record) = store.read().await else {
        debug!(endpoint = %options.endpoint, "no token stored, rejecting before send");
        return Err(Rejection::NoToken);
    };
    let expired = store.is_expired(&record);
    descriptor.token = Some(record.token.clone());
    if expired {
        debug!(
            endpoint = %descriptor.options.endpoint,
            expire_at = record.expire_at,
            "token expired, rejecting before send"
        );
        return Err(Rejection::TokenExpired);
    }

    let value = HeaderValue::from_str(&record.token)
        .map_err(|e| Rejection::InvalidToken(format!("token is not a valid header value: {e}")))?;
    request
        .headers
        .insert(HeaderName::from_static(ACCESS_TOKEN_HEADER), value);
    Ok(request)
}
