//! Session metrics
//!
//! Counters emitted through the `metrics` facade. Nothing is recorded unless
//! the host application installs a recorder.
//!
//! - `session_refresh_total` (counter): label `outcome`
//! - `session_logout_total` (counter)
//! - `api_calls_total` (counter): label `outcome`

/// Record the outcome of one network refresh (not of each waiter).
pub fn record_refresh(outcome: &str) {
    metrics::counter!("session_refresh_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a logout that actually fired (not one debounced by the cooldown).
pub fn record_logout() {
    metrics::counter!("session_logout_total").increment(1);
}

/// Record the final outcome of a facade call.
pub fn record_call(outcome: &str) {
    metrics::counter!("api_calls_total", "outcome" => outcome.to_string()).increment(1);
}
