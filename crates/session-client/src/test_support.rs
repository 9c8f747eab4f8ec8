//! Scripted collaborators shared by the pipeline and coordinator tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use session_store::{MemoryStore, TokenRecord, TokenStore};
use transport::{
    Method, Transport, TransportError, TransportFuture, TransportRequest, TransportResponse,
};

use crate::client::ApiClient;
use crate::coordinator::LogoutHandler;
use crate::notify::{Notification, Notifier};
use crate::settings::ClientSettings;

type Handler = dyn Fn(&TransportRequest) -> transport::Result<TransportResponse> + Send + Sync;

/// What the scripted transport saw for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct SentRequest {
    pub endpoint: String,
    pub method: Method,
    pub token: Option<String>,
    pub body: Option<Value>,
}

/// Transport answering from a closure, optionally after a delay.
pub struct ScriptedTransport {
    handler: Box<Handler>,
    delay: Mutex<Duration>,
    endpoint_delays: Mutex<HashMap<String, Duration>>,
    sent: Mutex<Vec<SentRequest>>,
}

impl ScriptedTransport {
    pub fn new(
        handler: impl Fn(&TransportRequest) -> transport::Result<TransportResponse>
        + Send
        + Sync
        + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            delay: Mutex::new(Duration::ZERO),
            endpoint_delays: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn with_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        *self.delay.lock().unwrap() = delay;
        self
    }

    /// Delay for one endpoint, overriding `with_delay`.
    pub fn with_endpoint_delay(self: Arc<Self>, endpoint: &str, delay: Duration) -> Arc<Self> {
        self.endpoint_delays
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), delay);
        self
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .count()
    }
}

impl Transport for ScriptedTransport {
    fn id(&self) -> &str {
        "scripted"
    }

    fn send<'a>(&'a self, request: &'a TransportRequest) -> TransportFuture<'a> {
        Box::pin(async move {
            if request.is_cancelled() {
                return Err(TransportError::Cancelled);
            }
            self.sent.lock().unwrap().push(SentRequest {
                endpoint: request.endpoint.clone(),
                method: request.method,
                token: request
                    .headers
                    .get("access-token")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
                body: request.body.clone(),
            });

            let delay = self
                .endpoint_delays
                .lock()
                .unwrap()
                .get(&request.endpoint)
                .copied()
                .unwrap_or_else(|| *self.delay.lock().unwrap());
            if !delay.is_zero() {
                match &request.cancel {
                    Some(cancel) => tokio::select! {
                        _ = cancel.cancelled() => return Err(TransportError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    },
                    None => tokio::time::sleep(delay).await,
                }
            }
            (self.handler)(request)
        })
    }
}

/// Notifier that keeps everything it is handed.
#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn seen(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

/// Logout handler that counts invocations.
#[derive(Default)]
pub struct CountingLogout {
    calls: AtomicUsize,
}

impl CountingLogout {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LogoutHandler for CountingLogout {
    fn on_logout(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// A client wired to scripted collaborators.
pub struct Harness {
    pub client: ApiClient,
    pub transport: Arc<ScriptedTransport>,
    pub store: TokenStore,
    pub notifier: Arc<RecordingNotifier>,
    pub logout: Arc<CountingLogout>,
}

impl Harness {
    pub async fn new(transport: Arc<ScriptedTransport>, record: Option<TokenRecord>) -> Self {
        let store = TokenStore::new(Arc::new(MemoryStore::new()));
        if let Some(record) = record {
            store.write(&record).await.unwrap();
        }
        let notifier = Arc::new(RecordingNotifier::default());
        let logout = Arc::new(CountingLogout::default());
        let client = ApiClient::new(
            transport.clone(),
            store.clone(),
            notifier.clone(),
            logout.clone(),
            &ClientSettings::default(),
        );
        Self {
            client,
            transport,
            store,
            notifier,
            logout,
        }
    }
}

pub fn far_future() -> u64 {
    common::now_millis() + 3_600_000
}

pub fn past() -> u64 {
    common::now_millis().saturating_sub(60_000)
}

pub fn ok(body: Value) -> transport::Result<TransportResponse> {
    Ok(TransportResponse { status: 200, body })
}

pub fn ok_envelope(data: Value) -> transport::Result<TransportResponse> {
    ok(json!({"status": "SUCCESS", "data": data}))
}

pub fn fail_envelope(status: &str, message: &str) -> transport::Result<TransportResponse> {
    ok(json!({"status": status, "code": "E_BUSINESS", "message": message}))
}

pub fn refreshed(token: &str, refresh: &str, expire_at: u64) -> transport::Result<TransportResponse> {
    ok_envelope(json!({"token": token, "refreshToken": refresh, "expireAt": expire_at}))
}

pub fn status(code: u16) -> transport::Result<TransportResponse> {
    Err(TransportError::Response {
        status: code,
        body: json!({"message": "status"}),
    })
}

/// Token the request carried, if any.
pub fn token_of(request: &TransportRequest) -> Option<&str> {
    request
        .headers
        .get("access-token")
        .and_then(|v| v.to_str().ok())
}
