//! The persisted token record

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Access/refresh token pair with its absolute expiry.
///
/// `expire_at` is a unix timestamp in milliseconds. A record serialized
/// without it, or with a value that is not a usable timestamp (null,
/// negative, non-numeric), deserializes as `0`, which reads as already
/// expired. Any other
/// fields the refresh endpoint returns are carried through untouched in
/// `extra`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    /// Access token presented on every authenticated request
    pub token: String,
    /// Refresh token, only ever sent to the refresh endpoint
    pub refresh_token: String,
    /// Expiration as unix timestamp in milliseconds
    #[serde(default, deserialize_with = "lenient_millis")]
    pub expire_at: u64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TokenRecord {
    pub fn new(token: impl Into<String>, refresh_token: impl Into<String>, expire_at: u64) -> Self {
        Self {
            token: token.into(),
            refresh_token: refresh_token.into(),
            expire_at,
            extra: serde_json::Map::new(),
        }
    }

    /// Both tokens present. Expiry is not checked here; a zero expiry is a
    /// valid, already expired record.
    pub fn has_tokens(&self) -> bool {
        !self.token.is_empty() && !self.refresh_token.is_empty()
    }

    /// Whether the access token expired before `now_millis`.
    pub fn is_expired_at(&self, now_millis: u64) -> bool {
        self.expire_at < now_millis
    }
}

/// Millisecond timestamp from whatever the producer wrote. Fractions are
/// truncated, numeric strings parsed, everything else is `0`.
fn lenient_millis<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let millis = match value {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f > 0.0)
                .map(|f| f as u64)
        }),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(millis.unwrap_or(0))
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expire_at", &self.expire_at)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case() {
        let json = r#"{"token":"at_1","refreshToken":"rt_1","expireAt":1735500000000}"#;
        let record: TokenRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.token, "at_1");
        assert_eq!(record.refresh_token, "rt_1");
        assert_eq!(record.expire_at, 1_735_500_000_000);
        assert!(record.extra.is_empty());
    }

    #[test]
    fn missing_expire_at_defaults_to_zero() {
        let json = r#"{"token":"at_1","refreshToken":"rt_1"}"#;
        let record: TokenRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.expire_at, 0);
        assert!(record.is_expired_at(1));
        assert!(record.has_tokens());
    }

    #[test]
    fn unusable_expire_at_reads_as_zero() {
        for raw in ["null", "-5", "true", r#""soon""#, "{}"] {
            let json = format!(r#"{{"token":"a","refreshToken":"r","expireAt":{raw}}}"#);
            let record: TokenRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(record.expire_at, 0, "expireAt {raw}");
            assert!(record.has_tokens());
        }
    }

    #[test]
    fn fractional_and_string_expire_at_are_accepted() {
        let json = r#"{"token":"a","refreshToken":"r","expireAt":1735500000000.75}"#;
        let record: TokenRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.expire_at, 1_735_500_000_000);

        let json = r#"{"token":"a","refreshToken":"r","expireAt":"1735500000000"}"#;
        let record: TokenRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.expire_at, 1_735_500_000_000);
    }

    #[test]
    fn opaque_fields_survive_a_round_trip() {
        let json = r#"{"token":"a","refreshToken":"r","expireAt":5,"userId":42,"scope":"admin"}"#;
        let record: TokenRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.extra["userId"], 42);

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["scope"], "admin");
        assert_eq!(back["refreshToken"], "r");
    }

    #[test]
    fn expiry_boundary_is_strict() {
        let record = TokenRecord::new("a", "r", 1000);
        assert!(!record.is_expired_at(1000));
        assert!(record.is_expired_at(1001));
    }

    #[test]
    fn debug_redacts_tokens() {
        let record = TokenRecord::new("secret-access", "secret-refresh", 1);
        let debug = format!("{record:?}");
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn empty_token_is_incomplete() {
        assert!(!TokenRecord::new("", "r", 1).has_tokens());
        assert!(!TokenRecord::new("a", "", 1).has_tokens());
        assert!(TokenRecord::new("a", "r", 0).has_tokens());
    }
}
