//! Error types for the protocol layer.
//!
//! Each crate in Parlor defines its own error enum. A `ProtocolError` always
//! means "the bytes or their shape were wrong", never "the request was not
//! allowed"; the latter is a `RoomError` in `parlor-room`.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, or wrong
    /// data types in a command payload.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but breaks a structural rule: an empty display
    /// name, an unknown game type, a chat message over the length limit.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
