//! User-facing notifications
//!
//! Rendering is somebody else's problem; the pipeline only emits
//! `Notification` values into a `Notifier` and never waits on the result.

use serde::Serialize;
use tracing::{info, warn};

/// Kind of notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyMode {
    Fail,
    Success,
}

/// A notification to show the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub mode: NotifyMode,
    pub title: String,
    pub content: String,
}

impl Notification {
    pub fn fail(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            mode: NotifyMode::Fail,
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn success(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            mode: NotifyMode::Success,
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Sink for notifications. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Notifier that writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.mode {
            NotifyMode::Fail => {
                warn!(title = %notification.title, content = %notification.content, "notification")
            }
            NotifyMode::Success => {
                info!(title = %notification.title, content = %notification.content, "notification")
            }
        }
    }
}

/// Title and body supplied by a caller for one outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotifyContent {
    pub title: String,
    pub content: String,
}

impl NotifyContent {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Per-call notification choices for `ApiClient::call_with_notification`.
///
/// `notify_on_fail` defaults to whether `on_fail` was supplied.
#[derive(Debug, Clone, Default)]
pub struct NotifyOptions {
    pub on_success: Option<NotifyContent>,
    pub on_fail: Option<NotifyContent>,
    pub notify_on_fail: Option<bool>,
}

impl NotifyOptions {
    pub fn fail_enabled(&self) -> bool {
        self.notify_on_fail.unwrap_or(self.on_fail.is_some())
    }

    /// Failure notification for `message`, merged into the caller's content.
    pub(crate) fn fail_notification(&self, message: &str) -> Notification {
        let base = self.on_fail.clone().unwrap_or_default();
        let title = if base.title.is_empty() {
            "Request failed".to_string()
        } else {
            base.title
        };
        let content = if base.content.is_empty() {
            message.to_string()
        } else {
            format!("{}: {message}", base.content)
        };
        Notification::fail(title, content)
    }
}
