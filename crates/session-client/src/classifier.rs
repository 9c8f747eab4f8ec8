//! Response classification
//!
//! Maps the outcome of one attempt (pre-flight rejection, transport error,
//! or 2xx response) onto the state the pipeline acts on. Pure: no I/O, no
//! side effects. The pipeline decides what each state means for refresh,
//! retry, logout, and notifications.

use serde_json::Value;
use session_store::Envelope;
use transport::{TransportError, TransportResponse};

use crate::authenticator::Rejection;

/// HTTP status that triggers refresh-and-retry.
const UNAUTHORIZED: u16 = 401;

/// Outcome of one attempt before classification.
#[derive(Debug)]
pub enum Attempt {
    Rejected(Rejection),
    Sent(transport::Result<TransportResponse>),
}

/// State entered for a completed attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Caller aborted the request
    Cancelled,
    /// Pre-flight found no token
    PreflightNoToken,
    /// HTTP 401, or pre-flight found the token expired
    Unauthorized,
    /// Any other non-2xx response
    ServerRespondedNon2xx { status: u16, payload: Value },
    /// Request left the client, nothing came back
    NoResponseReceived(String),
    /// Request could not be built or sent
    SetupFailure(String),
    /// 2xx, but the envelope reports failure
    BusinessFailure { envelope: Envelope, payload: Value },
    /// 2xx and the envelope reports success; carries `data`
    Success(Value),
}

impl Classification {
    /// Label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Cancelled => "cancelled",
            Classification::PreflightNoToken => "preflight_no_token",
            Classification::Unauthorized => "unauthorized",
            Classification::ServerRespondedNon2xx { .. } => "server_non_2xx",
            Classification::NoResponseReceived(_) => "no_response",
            Classification::SetupFailure(_) => "setup_failure",
            Classification::BusinessFailure { .. } => "business_failure",
            Classification::Success(_) => "success",
        }
    }
}

/// Classify one attempt.
///
/// A 2xx body that is not an envelope object has no success indicator and
/// is treated as a business failure.
pub fn classify(attempt: Attempt, success_status: &str) -> Classification {
    match attempt {
        Attempt::Rejected(Rejection::NoToken) => Classification::PreflightNoToken,
        Attempt::Rejected(Rejection::TokenExpired) => Classification::Unauthorized,
        Attempt::Rejected(Rejection::InvalidToken(reason)) => Classification::SetupFailure(reason),
        Attempt::Sent(Err(err)) => classify_error(err),
        Attempt::Sent(Ok(response)) => classify_payload(response.body, success_status),
    }
}

fn classify_error(err: TransportError) -> Classification {
    match err {
        TransportError::Cancelled => Classification::Cancelled,
        TransportError::Response { status, .. } if status == UNAUTHORIZED => {
            Classification::Unauthorized
        }
        TransportError::Response { status, body } => Classification::ServerRespondedNon2xx {
            status,
            payload: body,
        },
        TransportError::NoResponse(reason) => Classification::NoResponseReceived(reason),
        TransportError::Setup(reason) => Classification::SetupFailure(reason),
    }
}

fn classify_payload(payload: Value, success_status: &str) -> Classification {
    match Envelope::from_value(&payload) {
        Some(envelope) if envelope.is_req_success(success_status) => {
            Classification::Success(envelope.into_data())
        }
        Some(envelope) => Classification::BusinessFailure { envelope, payload },
        None => Classification::BusinessFailure {
            envelope: Envelope::default(),
            payload,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sent_ok(body: Value) -> Attempt {
        Attempt::Sent(Ok(TransportResponse { status: 200, body }))
    }

    fn sent_err(err: TransportError) -> Attempt {
        Attempt::Sent(Err(err))
    }

    #[test]
    fn success_envelope_yields_data() {
        let c = classify(
            sent_ok(json!({"status": "SUCCESS", "data": {"orders": []}})),
            "SUCCESS",
        );
        assert_eq!(c, Classification::Success(json!({"orders": []})));
    }

    #[test]
    fn failure_envelope_is_business_failure() {
        let payload = json!({"status": "FAIL", "code": "X", "message": "bad input"});
        let c = classify(sent_ok(payload.clone()), "SUCCESS");
        match c {
            Classification::BusinessFailure {
                envelope,
                payload: p,
            } => {
                assert_eq!(envelope.message.as_deref(), Some("bad input"));
                assert_eq!(envelope.code.as_deref(), Some("X"));
                assert_eq!(p, payload);
            }
            other => panic!("expected business failure, got {other:?}"),
        }
    }

    #[test]
    fn non_envelope_2xx_is_business_failure() {
        let c = classify(sent_ok(json!([1, 2, 3])), "SUCCESS");
        assert_eq!(c.label(), "business_failure");
    }

    #[test]
    fn custom_success_status_is_honored() {
        let c = classify(sent_ok(json!({"status": "ok", "data": 1})), "OK");
        assert_eq!(c, Classification::Success(json!(1)));
    }

    #[test]
    fn status_401_is_unauthorized() {
        let c = classify(
            sent_err(TransportError::Response {
                status: 401,
                body: json!({"message": "expired"}),
            }),
            "SUCCESS",
        );
        assert_eq!(c, Classification::Unauthorized);
    }

    #[test]
    fn expired_preflight_is_unauthorized() {
        let c = classify(Attempt::Rejected(Rejection::TokenExpired), "SUCCESS");
        assert_eq!(c, Classification::Unauthorized);
    }

    #[test]
    fn missing_token_preflight() {
        let c = classify(Attempt::Rejected(Rejection::NoToken), "SUCCESS");
        assert_eq!(c, Classification::PreflightNoToken);
    }

    #[test]
    fn unencodable_token_is_setup_failure() {
        let c = classify(
            Attempt::Rejected(Rejection::InvalidToken("bad".into())),
            "SUCCESS",
        );
        assert_eq!(c, Classification::SetupFailure("bad".into()));
    }

    #[test]
    fn forbidden_is_plain_server_error() {
        let c = classify(
            sent_err(TransportError::Response {
                status: 403,
                body: json!("nope"),
            }),
            "SUCCESS",
        );
        assert_eq!(
            c,
            Classification::ServerRespondedNon2xx {
                status: 403,
                payload: json!("nope")
            }
        );
    }

    #[test]
    fn server_5xx_is_server_error() {
        let c = classify(
            sent_err(TransportError::Response {
                status: 503,
                body: Value::Null,
            }),
            "SUCCESS",
        );
        assert_eq!(c.label(), "server_non_2xx");
    }

    #[test]
    fn cancelled_no_response_and_setup() {
        assert_eq!(
            classify(sent_err(TransportError::Cancelled), "SUCCESS"),
            Classification::Cancelled
        );
        assert_eq!(
            classify(sent_err(TransportError::NoResponse("timeout".into())), "SUCCESS"),
            Classification::NoResponseReceived("timeout".into())
        );
        assert_eq!(
            classify(sent_err(TransportError::Setup("bad url".into())), "SUCCESS"),
            Classification::SetupFailure("bad url".into())
        );
    }
}
