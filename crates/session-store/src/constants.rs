//! Session constants
//!
//! Header and key names agreed with the API server. The refresh path and the
//! success status are configurable; these are the defaults.

/// Key under which the serialized token record is stored
pub const TOKEN_KEY: &str = "token";

/// Header carrying the access token on authenticated requests and on the
/// refresh call itself (`Access-Token` on the wire; lowercase for `HeaderName`)
pub const ACCESS_TOKEN_HEADER: &str = "access-token";

/// Default refresh endpoint, relative to the API base URL
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";

/// Envelope `status` value that marks business success
pub const DEFAULT_SUCCESS_STATUS: &str = "SUCCESS";

/// Window during which repeated logouts are no-ops
pub const DEFAULT_LOGOUT_COOLDOWN_MS: u64 = 1000;
