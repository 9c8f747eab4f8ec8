//! Request facade and pipeline
//!
//! `ApiClient` runs each call through pre-flight, transport and
//! classification, then acts on the classified state: refresh and replay
//! once on `Unauthorized`, log out when authentication cannot be recovered,
//! notify on business failures. Every outcome is returned as a value.

use std::sync::Arc;

use serde_json::Value;
use session_store::TokenStore;
use tracing::{debug, info, instrument, warn};
use transport::Transport;

use crate::authenticator::authorize;
use crate::classifier::{Attempt, Classification, classify};
use crate::coordinator::{LogoutHandler, RefreshCoordinator};
use crate::error::{ClassifiedError, Result};
use crate::metrics;
use crate::notify::{Notification, Notifier, NotifyOptions};
use crate::options::{RequestDescriptor, RequestOptions};
use crate::settings::ClientSettings;

/// Title of a business-failure notification when the envelope has no status.
const DEFAULT_FAIL_TITLE: &str = "Request failed";

/// Authenticated API client. Cheap to clone; clones share the coordinator.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    store: TokenStore,
    coordinator: RefreshCoordinator,
    notifier: Arc<dyn Notifier>,
    success_status: String,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: TokenStore,
        notifier: Arc<dyn Notifier>,
        logout_handler: Arc<dyn LogoutHandler>,
        settings: &ClientSettings,
    ) -> Self {
        let coordinator =
            RefreshCoordinator::new(store.clone(), transport.clone(), logout_handler, settings);
        Self {
            transport,
            store,
            coordinator,
            notifier,
            success_status: settings.success_status.clone(),
        }
    }

    /// Explicit refresh/logout access.
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Run one request. Resolves to the envelope's `data` on success.
    pub async fn call(&self, options: RequestOptions) -> Result<Value> {
        let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
        self.dispatch(RequestDescriptor::new(options), request_id).await
    }

    /// Run one request described by an arbitrary JSON configuration.
    ///
    /// Only the recognized option names are read; a malformed value for one
    /// of them fails with `SetupError` before anything is sent.
    pub async fn call_json(&self, config: Value) -> Result<Value> {
        match RequestOptions::from_value(config) {
            Ok(options) => self.call(options).await,
            Err(e) => {
                warn!(error = %e, "rejecting malformed request options");
                metrics::record_call("setup_error");
                Err(ClassifiedError::SetupError(format!(
                    "invalid request options: {e}"
                )))
            }
        }
    }

    /// Run one request and announce its outcome through the notifier.
    ///
    /// While this wrapper owns the failure notification, the pipeline's own
    /// business-failure notification is suppressed. Cancellations are never
    /// announced.
    pub async fn call_with_notification(
        &self,
        mut options: RequestOptions,
        notify: NotifyOptions,
    ) -> Result<Value> {
        let fail_enabled = notify.fail_enabled();
        if fail_enabled {
            options.disable_error_notification = true;
        }

        let result = self.call(options).await;
        match &result {
            Ok(_) => {
                if let Some(success) = &notify.on_success {
                    self.notifier.notify(Notification::success(
                        success.title.clone(),
                        success.content.clone(),
                    ));
                }
            }
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                if fail_enabled {
                    self.notifier.notify(notify.fail_notification(&e.message()));
                }
            }
        }
        result
    }

    #[instrument(skip_all, fields(
        request_id = %request_id,
        method = %descriptor.options.method,
        endpoint = %descriptor.options.endpoint
    ))]
    async fn dispatch(&self, descriptor: RequestDescriptor, request_id: String) -> Result<Value> {
        let result = self.execute(descriptor).await;
        match &result {
            Ok(_) => {
                debug!("request succeeded");
                metrics::record_call("success");
            }
            Err(e) if e.is_cancelled() => {
                debug!("request cancelled");
                metrics::record_call(e.kind());
            }
            Err(e) => {
                info!(kind = e.kind(), error = %e, "request failed");
                metrics::record_call(e.kind());
            }
        }
        result
    }

    /// The attempt loop. At most two attempts: the original and one replay
    /// after a successful refresh.
    async fn execute(&self, mut descriptor: RequestDescriptor) -> Result<Value> {
        loop {
            if descriptor.is_cancelled() {
                return Err(ClassifiedError::Cancelled);
            }

            let attempt = match authorize(&self.store, &mut descriptor).await {
                Ok(request) => {
                    debug!(transport = self.transport.id(), retried = descriptor.retried, "sending");
                    Attempt::Sent(self.transport.send(&request).await)
                }
                Err(rejection) => Attempt::Rejected(rejection),
            };

            let classification = classify(attempt, &self.success_status);
            debug!(
                state = classification.label(),
                retried = descriptor.retried,
                "attempt classified"
            );

            match classification {
                Classification::Success(data) => return Ok(data),
                Classification::Cancelled => return Err(ClassifiedError::Cancelled),
                Classification::PreflightNoToken => {
                    self.coordinator.logout().await;
                    return Err(ClassifiedError::NoToken);
                }
                Classification::Unauthorized if descriptor.retried => {
                    warn!("still unauthorized after refresh, ending session");
                    self.coordinator.logout().await;
                    return Err(ClassifiedError::TokenExpired);
                }
                Classification::Unauthorized => {
                    self.coordinator
                        .refresh_stale(descriptor.token.as_deref())
                        .await?;
                    if descriptor.is_cancelled() {
                        return Err(ClassifiedError::Cancelled);
                    }
                    descriptor.retried = true;
                }
                Classification::ServerRespondedNon2xx { status, payload } => {
                    return Err(ClassifiedError::ServerError { status, payload });
                }
                Classification::NoResponseReceived(reason) => {
                    return Err(ClassifiedError::NoResponse(reason));
                }
                Classification::SetupFailure(reason) => {
                    return Err(ClassifiedError::SetupError(reason));
                }
                Classification::BusinessFailure { envelope, payload } => {
                    let title = envelope
                        .status
                        .clone()
                        .filter(|s| !s.is_empty())
                        .unwrap_or_else(|| DEFAULT_FAIL_TITLE.to_string());
                    let err = ClassifiedError::business(envelope, payload);
                    if !descriptor.options.disable_error_notification {
                        self.notifier.notify(Notification::fail(title, err.message()));
                    }
                    return Err(err);
                }
            }
        }
    }
}
