use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Short-lived credential used to open the hosted linking widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectToken {
    #[serde(alias = "accessToken")]
    pub access_token: String,
    #[serde(default, alias = "expiresAt")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl ConnectToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// Outcome reported by the linking widget when a session ends.
///
/// Success carries the new connection as the widget delivered it; error
/// carries a message and, sometimes, a connection the aggregator created
/// before the failure.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionResult {
    Success {
        connection: Value,
    },
    Error {
        message: String,
        partial_connection: Option<Value>,
    },
}

impl SessionResult {
    /// Read the widget's callback payload: `{item}` / `{connection}` on
    /// success, `{message, data?: {item?}}` on error.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let object = payload.as_object()?;
        if let Some(message) = object.get("message").and_then(Value::as_str) {
            let partial_connection = object
                .get("data")
                .and_then(|d| d.get("item").or_else(|| d.get("connection")))
                .or_else(|| object.get("partialConnection"))
                .filter(|v| v.is_object())
                .cloned();
            return Some(SessionResult::Error {
                message: message.to_string(),
                partial_connection,
            });
        }
        object
            .get("item")
            .or_else(|| object.get("connection"))
            .filter(|v| v.is_object())
            .map(|c| SessionResult::Success {
                connection: c.clone(),
            })
    }
}
