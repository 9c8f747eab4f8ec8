//! Authenticated request pipeline with single-flight token refresh
//!
//! Every call goes through the same stages:
//!
//! 1. Pre-flight (`authenticator`): attach the access token, or stop the
//!    request locally when the token is missing or already expired
//! 2. Transport: one network attempt
//! 3. Classification (`classifier`): map the attempt to a state
//! 4. Recovery (`client`): refresh and replay once on `Unauthorized`,
//!    log out when the session cannot be recovered, notify on business
//!    failures
//!
//! Concurrent callers that all hit an expired session share a single refresh
//! through `RefreshCoordinator`.

pub mod authenticator;
pub mod classifier;
pub mod client;
pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod notify;
pub mod options;
pub mod settings;

#[cfg(test)]
mod test_support;

pub use client::ApiClient;
pub use coordinator::{LogoutHandler, LogoutLock, RefreshCoordinator};
pub use error::{ClassifiedError, Result};
pub use notify::{Notification, Notifier, NotifyContent, NotifyMode, NotifyOptions, TracingNotifier};
pub use options::{RequestDescriptor, RequestOptions};
pub use settings::ClientSettings;
