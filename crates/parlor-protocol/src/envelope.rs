//! The JSON envelope every client message arrives in, and the frame every
//! server message leaves in.
//!
//! ```text
//! inbound:   { "type": "join", "payload": "{\"code\":\"ABC234\"}", "username": "alice" }
//! outbound:  { "type": "roomJoined", "payload": "{\"code\":\"ABC234\",...}" }
//! ```
//!
//! Browser clients double-encode: `payload` is a *string* holding JSON.
//! We accept that form and an inline object, and we always send the string
//! form back so `JSON.parse(msg.payload)` keeps working on the client.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProtocolError;

/// An inbound client message before it is classified into a
/// [`Command`](crate::Command).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// The command kind (`"create"`, `"move"`, ...).
    #[serde(rename = "type")]
    pub kind: String,

    /// Command-specific data: a JSON-encoded string, an inline object, or
    /// absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,

    /// Variant tag used by `create`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_type: Option<String>,

    /// Room code, a fallback for `join`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Display name used by `create` and as a fallback for `join`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Envelope {
    /// Creates an envelope of the given kind with no payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Attaches a payload, stored in the double-encoded string form.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(Value::String(payload.to_string()));
        self
    }

    /// Decodes the payload into `T`.
    ///
    /// A missing, `null` or blank-string payload decodes as `{}`, so
    /// payload structs whose fields are all optional still succeed.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the payload is not valid JSON or
    /// doesn't have the shape `T` expects.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        let empty = || Value::Object(serde_json::Map::new());
        match &self.payload {
            None | Some(Value::Null) => serde_json::from_value(empty()),
            Some(Value::String(raw)) if raw.trim().is_empty() => {
                serde_json::from_value(empty())
            }
            Some(Value::String(raw)) => serde_json::from_str(raw),
            Some(inline) => T::deserialize(inline),
        }
        .map_err(ProtocolError::Decode)
    }
}

/// An outbound server message, ready for the codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    /// The event kind (`"roomCreated"`, `"gameEnd"`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// JSON text for structured events, plain text for `error` and
    /// `hostLeft`, empty for `restart`.
    pub payload: String,
}
