//! Wire envelope shared by requests and responses.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Envelope payload: a JSON object whose shape depends on the message type.
pub type Payload = Map<String, Value>;

/// The `{type, payload}` unit exchanged over the WebSocket.
///
/// On input `payload` may be omitted or `null`; both decode to an empty
/// object. On output `payload` is always present.
///
/// # Example
///
/// ```rust
/// use envscan_daemon::MessageEnvelope;
///
/// let env: MessageEnvelope = serde_json::from_str(r#"{"type":"scan_env"}"#).unwrap();
/// assert_eq!(env.kind, "scan_env");
/// assert!(env.payload.is_empty());
///
/// let err = MessageEnvelope::error("Invalid JSON");
/// assert_eq!(
///     serde_json::to_string(&err).unwrap(),
///     r#"{"type":"error","payload":{"message":"Invalid JSON"}}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Payload")]
pub struct MessageEnvelope {
    /// Message type tag.
    #[serde(rename = "type")]
    pub kind: String,

    /// Type-specific body.
    pub payload: Payload,
}

/// Field layout of an inbound envelope.
///
/// Decoded from an already-parsed object only, so a positional JSON array
/// can never stand in for `{type, payload}`.
#[derive(Deserialize)]
struct InboundFields {
    #[serde(rename = "type")]
    kind: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    payload: Payload,
}

impl TryFrom<Payload> for MessageEnvelope {
    type Error = serde_json::Error;

    fn try_from(object: Payload) -> Result<Self, Self::Error> {
        let fields: InboundFields = serde_json::from_value(Value::Object(object))?;
        Ok(Self::new(fields.kind, fields.payload))
    }
}

impl MessageEnvelope {
    /// Envelope with the given type and payload.
    pub fn new(kind: impl Into<String>, payload: Payload) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Envelope with the given type and a single payload field.
    pub fn with_field(kind: impl Into<String>, key: &str, value: impl Into<Value>) -> Self {
        let mut payload = Payload::new();
        payload.insert(key.to_string(), value.into());
        Self::new(kind, payload)
    }

    /// `{"type":"error","payload":{"message":<message>}}`
    pub fn error(message: impl Into<String>) -> Self {
        Self::with_field("error", "message", message.into())
    }

    /// Decode an envelope from a text frame.
    ///
    /// The frame must be a JSON object with a string `type`; arrays and
    /// scalars are rejected.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Encode for a text frame.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Payload, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Payload>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_with_payload() {
        let env = MessageEnvelope::from_json(r#"{"type":"ping","payload":{"timestamp":42}}"#).unwrap();
        assert_eq!(env.kind, "ping");
        assert_eq!(env.payload.get("timestamp"), Some(&json!(42)));
    }

    #[test]
    fn test_decode_missing_or_null_payload() {
        let missing = MessageEnvelope::from_json(r#"{"type":"frobnicate"}"#).unwrap();
        assert!(missing.payload.is_empty());

        let null = MessageEnvelope::from_json(r#"{"type":"frobnicate","payload":null}"#).unwrap();
        assert!(null.payload.is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_shapes() {
        for raw in [
            "not json",
            "[]",
            "42",
            r#"["ping",{"timestamp":7}]"#,
            r#"["echo"]"#,
            r#"{"payload":{}}"#,
            r#"{"type":7}"#,
            r#"{"type":null}"#,
            r#"{"type":"ping","payload":[1,2]}"#,
            r#"{"type":"ping","payload":"x"}"#,
        ] {
            assert!(MessageEnvelope::from_json(raw).is_err(), "accepted {raw}");
        }
    }

    #[test]
    fn test_positional_array_is_not_an_envelope() {
        let err = serde_json::from_str::<MessageEnvelope>(r#"["ping",{"timestamp":7}]"#)
            .unwrap_err();
        assert!(err.is_data(), "{err}");

        let from_value = serde_json::from_value::<MessageEnvelope>(json!(["echo"]));
        assert!(from_value.is_err());
    }

    #[test]
    fn test_unknown_top_level_fields_ignored() {
        let env = MessageEnvelope::from_json(r#"{"type":"ping","id":"abc"}"#).unwrap();
        assert_eq!(env.kind, "ping");
    }

    #[test]
    fn test_encode_always_has_payload() {
        let env = MessageEnvelope::new("agent_started", Payload::new());
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({"type": "agent_started", "payload": {}})
        );
    }

    #[test]
    fn test_error_envelope() {
        let env = MessageEnvelope::error("Unknown message type: frobnicate");
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({"type": "error", "payload": {"message": "Unknown message type: frobnicate"}})
        );
    }
}
