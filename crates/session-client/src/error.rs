//! Classified request failures
//!
//! Every failure that leaves the pipeline is one of these variants. The
//! variant is decided once, at the boundary between transport and
//! classifier, and never re-derived from the error's contents downstream.

use serde_json::Value;
use session_store::Envelope;
use transport::TransportError;

/// Closed set of request outcomes other than success.
///
/// `Clone` so a single refresh outcome can be handed to every caller waiting
/// on it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifiedError {
    #[error("request cancelled")]
    Cancelled,

    #[error("not logged in")]
    NoToken,

    #[error("session expired")]
    TokenExpired,

    #[error("server responded with status {status}")]
    ServerError { status: u16, payload: Value },

    #[error("no response from server: {0}")]
    NoResponse(String),

    #[error("request setup failed: {0}")]
    SetupError(String),

    #[error("{}", .message.as_deref().unwrap_or("request failed"))]
    BusinessError {
        status: Option<String>,
        code: Option<String>,
        message: Option<String>,
        payload: Value,
    },
}

impl ClassifiedError {
    /// Build a business error from a decoded envelope and its raw payload.
    pub fn business(envelope: Envelope, payload: Value) -> Self {
        Self::BusinessError {
            status: envelope.status,
            code: envelope.code,
            message: envelope.message,
            payload,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClassifiedError::Cancelled)
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifiedError::Cancelled => "cancelled",
            ClassifiedError::NoToken => "no_token",
            ClassifiedError::TokenExpired => "token_expired",
            ClassifiedError::ServerError { .. } => "server_error",
            ClassifiedError::NoResponse(_) => "no_response",
            ClassifiedError::SetupError(_) => "setup_error",
            ClassifiedError::BusinessError { .. } => "business_error",
        }
    }

    /// Human-readable message, suitable for a notification body.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<TransportError> for ClassifiedError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Cancelled => ClassifiedError::Cancelled,
            TransportError::Response { status, body } => ClassifiedError::ServerError {
                status,
                payload: body,
            },
            TransportError::NoResponse(reason) => ClassifiedError::NoResponse(reason),
            TransportError::Setup(reason) => ClassifiedError::SetupError(reason),
        }
    }
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ClassifiedError>;
