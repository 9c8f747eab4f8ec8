//! API response envelope
//!
//! Every JSON response from the API server, the refresh endpoint included,
//! wraps its payload as `{status, code, message, data}`. Transport success
//! (2xx) says nothing about business success; `status` does.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decoded response envelope.
///
/// Every field is optional on the wire so that a foreign or truncated body
/// still decodes and is classified as a business failure instead of a
/// parse error.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Envelope {
    #[serde(default, deserialize_with = "string_or_number")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl Envelope {
    /// Decode an envelope from a JSON body. Non-object bodies yield `None`.
    pub fn from_value(body: &Value) -> Option<Self> {
        if !body.is_object() {
            return None;
        }
        serde_json::from_value(body.clone()).ok()
    }

    /// Business success: `status` matches `success_status`, ignoring case.
    pub fn is_req_success(&self, success_status: &str) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(success_status))
    }

    /// Payload data, `null` when the server sent none.
    pub fn into_data(self) -> Value {
        self.data.unwrap_or(Value::Null)
    }
}

/// Servers disagree on whether `status` and `code` are strings or numbers.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_status_is_case_insensitive() {
        let env = Envelope::from_value(&json!({"status": "success", "data": {"id": 1}})).unwrap();
        assert!(env.is_req_success("SUCCESS"));
        assert_eq!(env.into_data(), json!({"id": 1}));
    }

    #[test]
    fn failure_envelope_keeps_code_and_message() {
        let env = Envelope::from_value(&json!({
            "status": "FAIL",
            "code": "X",
            "message": "bad input"
        }))
        .unwrap();
        assert!(!env.is_req_success("SUCCESS"));
        assert_eq!(env.code.as_deref(), Some("X"));
        assert_eq!(env.message.as_deref(), Some("bad input"));
    }

    #[test]
    fn numeric_code_becomes_string() {
        let env = Envelope::from_value(&json!({"status": "FAIL", "code": 4001})).unwrap();
        assert_eq!(env.code.as_deref(), Some("4001"));
    }

    #[test]
    fn missing_status_is_not_success() {
        let env = Envelope::from_value(&json!({"data": 1})).unwrap();
        assert!(!env.is_req_success("SUCCESS"));
    }

    #[test]
    fn non_object_body_is_not_an_envelope() {
        assert!(Envelope::from_value(&json!("plain text")).is_none());
        assert!(Envelope::from_value(&Value::Null).is_none());
    }

    #[test]
    fn missing_data_is_null() {
        let env = Envelope::from_value(&json!({"status": "SUCCESS"})).unwrap();
        assert_eq!(env.into_data(), Value::Null);
    }
}
