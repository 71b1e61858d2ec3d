//! Wire envelope and transport events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A named event with an arbitrary JSON payload, sent as one text frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Envelope {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a text frame. Empty event names are rejected.
    pub fn decode(text: &str) -> Result<Self, EnvelopeError> {
        let envelope: Envelope = serde_json::from_str(text)?;
        if envelope.event.is_empty() {
            return Err(EnvelopeError::EmptyEvent);
        }
        Ok(envelope)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),
    #[error("envelope has an empty event name")]
    EmptyEvent,
}

/// What subscribers of a transport handle observe.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected(ConnectionId),
    Message {
        connection: ConnectionId,
        envelope: Envelope,
    },
    Disconnected(ConnectionId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_defaults_missing_data() {
        let envelope = Envelope::decode(r#"{"event":"ping"}"#).unwrap();
        assert_eq!(envelope.event, "ping");
        assert_eq!(envelope.data, serde_json::Value::Null);
    }

    #[test]
    fn test_decode_rejects_empty_event() {
        let err = Envelope::decode(r#"{"event":"","data":1}"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::EmptyEvent));
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(matches!(
            Envelope::decode("hello").unwrap_err(),
            EnvelopeError::Json(_)
        ));
    }

    #[test]
    fn test_encode_shape() {
        let text = Envelope::new("chat", json!({"text": "hi"})).encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({"event": "chat", "data": {"text": "hi"}}));
    }

    #[test]
    fn test_connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
        assert!(ConnectionId::new().to_string().starts_with("conn-"));
    }
}
