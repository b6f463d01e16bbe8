//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The connection handler doesn't care HOW messages are serialized: it
//! decodes inbound [`Envelope`](crate::Envelope)s and encodes outbound
//! [`OutboundFrame`](crate::OutboundFrame)s through whatever implements
//! [`Codec`]. Browser clients speak JSON, so [`JsonCodec`] is the one we
//! ship.

use serde::{Serialize, de::DeserializeOwned};

use crate::{OutboundFrame, ProtocolError, ServerEvent};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → safe to share between threads (the codec lives in
///   shared server state and is used from every connection task).
/// - `'static` → the codec owns everything it needs, as required for
///   types stored in long-lived async tasks.
///
/// `DeserializeOwned` (vs plain `Deserialize`) means the result doesn't
/// borrow from the input bytes, so the read buffer can be dropped right
/// after decoding.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Renders a server event into its wire frame and encodes it.
    fn encode_event(&self, event: &ServerEvent) -> Result<Vec<u8>, ProtocolError> {
        let frame: OutboundFrame = event.to_frame()?;
        self.encode(&frame)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use parlor_protocol::{Codec, Envelope, JsonCodec, ServerEvent};
///
/// let codec = JsonCodec;
///
/// let env: Envelope = codec
///     .decode(br#"{"type":"create","payload":"","username":"alice"}"#)
///     .unwrap();
/// assert_eq!(env.kind, "create");
///
/// let bytes = codec
///     .encode_event(&ServerEvent::Error("Room is full".into()))
///     .unwrap();
/// assert_eq!(bytes, br#"{"type":"error","payload":"Room is full"}"#);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
