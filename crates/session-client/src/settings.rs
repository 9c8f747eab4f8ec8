//! Client tuning knobs

use std::time::Duration;

use session_store::{DEFAULT_LOGOUT_COOLDOWN_MS, DEFAULT_REFRESH_PATH, DEFAULT_SUCCESS_STATUS};

/// Settings shared by the coordinator and the request pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Refresh endpoint, resolved by the transport like any other endpoint
    pub refresh_path: String,
    /// Envelope `status` that marks business success
    pub success_status: String,
    /// Window during which repeated logouts are no-ops
    pub logout_cooldown: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            success_status: DEFAULT_SUCCESS_STATUS.to_string(),
            logout_cooldown: Duration::from_millis(DEFAULT_LOGOUT_COOLDOWN_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_server_conventions() {
        let settings = ClientSettings::default();
        assert_eq!(settings.refresh_path, "/auth/refresh");
        assert_eq!(settings.success_status, "SUCCESS");
        assert_eq!(settings.logout_cooldown, Duration::from_millis(1000));
    }
}
