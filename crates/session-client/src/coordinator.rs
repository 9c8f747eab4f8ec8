//! Single-flight token refresh and debounced logout
//!
//! The coordinator owns two pieces of state:
//!
//! - the refresh state: at most one refresh future exists at a time. Callers
//!   that arrive while it is pending clone and await the same shared future,
//!   so N concurrent 401s produce one network refresh and N identical results.
//!   The refresh future empties the slot itself when it settles and keeps
//!   the record it obtained. A caller whose 401 was caused by a token that
//!   refresh already replaced gets that record back instead of refreshing
//!   again.
//! - the logout lock: the first logout clears the token and fires the
//!   `LogoutHandler`; logouts inside the cooldown window are no-ops.
//!
//! Refresh outcomes:
//! 1. Envelope success with a token record → persist, hand to all waiters
//! 2. Envelope failure → logout, `BusinessError`
//! 3. Transport failure → logout, transport error mapped 1:1
//!    (non-2xx → `ServerError`, nothing back → `NoResponse`, ...)

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use reqwest::header::{HeaderName, HeaderValue};
use serde_json::{Value, json};
use session_store::{ACCESS_TOKEN_HEADER, Envelope, TokenRecord, TokenStore};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use transport::{Method, Transport, TransportRequest};

use crate::error::{ClassifiedError, Result};
use crate::metrics;
use crate::settings::ClientSettings;

/// Side effect run when the session ends (e.g. route to the entry page).
pub trait LogoutHandler: Send + Sync {
    fn on_logout(&self);
}

type RefreshFuture = Shared<BoxFuture<'static, Result<TokenRecord>>>;

#[derive(Default)]
struct RefreshState {
    in_flight: Option<RefreshFuture>,
    /// Record issued by the last refresh that succeeded; cleared on logout
    latest: Option<TokenRecord>,
}

enum Ticket {
    Rotated(TokenRecord),
    Wait(RefreshFuture),
}

/// Debounce for logout side effects.
///
/// Holds the instant until which further logouts are suppressed. Uses tokio's
/// clock so paused-time tests can step over the window.
#[derive(Debug)]
pub struct LogoutLock {
    cooldown: Duration,
    locked_until: Mutex<Option<Instant>>,
}

impl LogoutLock {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            locked_until: Mutex::new(None),
        }
    }

    /// Take the lock if it is free. Returns `false` inside the window.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut until = self
            .locked_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match *until {
            Some(deadline) if now < deadline => false,
            _ => {
                *until = Some(now + self.cooldown);
                true
            }
        }
    }

    /// Whether a logout inside the current window would be suppressed.
    pub fn is_held(&self) -> bool {
        let until = self
            .locked_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        until.is_some_and(|deadline| Instant::now() < deadline)
    }
}

struct Inner {
    store: TokenStore,
    transport: Arc<dyn Transport>,
    handler: Arc<dyn LogoutHandler>,
    refresh_path: String,
    success_status: String,
    state: Mutex<RefreshState>,
    logout_lock: LogoutLock,
}

/// Shared refresh/logout coordinator. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    pub fn new(
        store: TokenStore,
        transport: Arc<dyn Transport>,
        handler: Arc<dyn LogoutHandler>,
        settings: &ClientSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                transport,
                handler,
                refresh_path: settings.refresh_path.clone(),
                success_status: settings.success_status.clone(),
                state: Mutex::new(RefreshState::default()),
                logout_lock: LogoutLock::new(settings.logout_cooldown),
            }),
        }
    }

    /// Obtain a fresh token record, joining a refresh already in flight.
    ///
    /// Fails with `NoToken` without touching the network when no record is
    /// stored. Every failure other than `NoToken` has already triggered a
    /// logout by the time it is returned.
    pub async fn refresh_token(&self) -> Result<TokenRecord> {
        self.refresh_stale(None).await
    }

    /// Like `refresh_token`, for a caller rejected while presenting
    /// `stale_token`.
    ///
    /// If a refresh has already replaced that token and the replacement is
    /// still valid, the replacement is returned without a network call.
    pub async fn refresh_stale(&self, stale_token: Option<&str>) -> Result<TokenRecord> {
        match self.ticket(stale_token) {
            Ticket::Rotated(record) => Ok(record),
            Ticket::Wait(refresh) => refresh.await,
        }
    }

    /// Decide under the lock whether to reuse, join or start a refresh.
    fn ticket(&self, stale_token: Option<&str>) -> Ticket {
        let mut state = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = &state.in_flight {
            debug!("refresh already in flight, joining");
            return Ticket::Wait(existing.clone());
        }

        let rotated = match (stale_token, &state.latest) {
            (Some(stale), Some(latest))
                if latest.token != stale && !latest.is_expired_at(common::now_millis()) =>
            {
                Some(latest.clone())
            }
            _ => None,
        };
        if let Some(record) = rotated {
            debug!("token already rotated by an earlier refresh, skipping");
            return Ticket::Rotated(record);
        }

        let inner = self.inner.clone();
        let refresh = async move {
            let outcome = inner.run_refresh().await;
            inner.settle(&outcome);
            outcome
        }
        .boxed()
        .shared();
        state.in_flight = Some(refresh.clone());
        Ticket::Wait(refresh)
    }

    /// End the session unless a logout fired within the cooldown window.
    ///
    /// Returns whether the side effects ran.
    pub async fn logout(&self) -> bool {
        self.inner.logout().await
    }

    /// Whether a refresh is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_flight
            .is_some()
    }

    pub fn logout_lock(&self) -> &LogoutLock {
        &self.inner.logout_lock
    }
}

impl Inner {
    async fn run_refresh(&self) -> Result<TokenRecord> {
        let Some(current) = self.store.read().await else {
            warn!("refresh requested without a stored token");
            metrics::record_refresh("no_token");
            return Err(ClassifiedError::NoToken);
        };

        info!("refreshing access token");
        let outcome = match self.build_request(&current) {
            Ok(request) => match self.transport.send(&request).await {
                Ok(response) => self.accept(response.body),
                Err(e) => Err(ClassifiedError::from(e)),
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(record) => {
                if let Err(e) = self.store.write(&record).await {
                    warn!(error = %e, "failed to persist refreshed token");
                }
                info!(expire_at = record.expire_at, "token refresh succeeded");
                metrics::record_refresh("success");
                Ok(record)
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "token refresh failed, ending session");
                metrics::record_refresh(e.kind());
                self.logout().await;
                Err(e)
            }
        }
    }

    fn build_request(&self, current: &TokenRecord) -> Result<TransportRequest> {
        let token = HeaderValue::from_str(&current.token).map_err(|e| {
            ClassifiedError::SetupError(format!("token is not a valid header value: {e}"))
        })?;
        let mut request = TransportRequest::new(Method::Post, self.refresh_path.clone());
        request
            .headers
            .insert(HeaderName::from_static(ACCESS_TOKEN_HEADER), token);
        request.body = Some(json!({ "refreshToken": current.refresh_token }));
        Ok(request)
    }

    /// Turn a 2xx refresh payload into a record, or a business error.
    fn accept(&self, payload: Value) -> Result<TokenRecord> {
        let Some(envelope) = Envelope::from_value(&payload) else {
            return Err(ClassifiedError::BusinessError {
                status: None,
                code: None,
                message: Some("refresh response is not an envelope".into()),
                payload,
            });
        };
        if !envelope.is_req_success(&self.success_status) {
            return Err(ClassifiedError::business(envelope, payload));
        }

        let data = envelope.data.clone().unwrap_or(Value::Null);
        match serde_json::from_value::<TokenRecord>(data) {
            Ok(record) if record.has_tokens() => Ok(record),
            Ok(_) | Err(_) => Err(ClassifiedError::BusinessError {
                status: envelope.status,
                code: envelope.code,
                message: Some("refresh response carries no token record".into()),
                payload,
            }),
        }
    }

    /// Empty the slot and remember what the refresh produced.
    fn settle(&self, outcome: &Result<TokenRecord>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.in_flight = None;
        state.latest = outcome.as_ref().ok().cloned();
    }

    async fn logout(&self) -> bool {
        if !self.logout_lock.try_acquire() {
            debug!("logout within cooldown window, skipping");
            return false;
        }
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .latest = None;
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "failed to clear token record on logout");
        }
        self.handler.on_logout();
        metrics::record_logout();
        info!("session ended");
        true
    }
}
