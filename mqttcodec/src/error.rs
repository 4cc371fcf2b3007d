//! Error types for mqttcodec.

use std::io;

use crate::decoder::Fault;
use crate::reason::DisconnectReasonCode;

/// Result type alias for mqttcodec.
pub type Result<T> = std::result::Result<T, Error>;

/// Result of a single decode step inside a packet decoder.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// A decode fault.
///
/// Carries the reason code of the DISCONNECT the connection will be closed
/// with, and a human readable description of what was wrong with the bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason_code:?}: {message}")]
pub struct DecodeError {
    /// Reason code for the outgoing DISCONNECT.
    pub reason_code: DisconnectReasonCode,
    /// Description of the violation.
    pub message: String,
}

impl DecodeError {
    /// Create a fault with an explicit reason code.
    pub fn new(reason_code: DisconnectReasonCode, message: impl Into<String>) -> Self {
        Self {
            reason_code,
            message: message.into(),
        }
    }

    /// Structurally invalid bytes.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(DisconnectReasonCode::MalformedPacket, message)
    }

    /// Well-formed but semantically forbidden content.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(DisconnectReasonCode::ProtocolError, message)
    }

    /// A single-occurrence property appeared twice.
    pub(crate) fn more_than_once(name: &str) -> Self {
        Self::protocol(format!("{name} must not be included more than once"))
    }

    /// A property identifier not allowed in the packet being decoded.
    pub(crate) fn wrong_property(id: u32) -> Self {
        Self::malformed(format!("wrong property with identifier {id}"))
    }

    /// A reason code byte outside the allowed set.
    pub(crate) fn wrong_reason_code(code: u8) -> Self {
        Self::malformed(format!("wrong reason code: {code:#04x}"))
    }

    /// Bytes left over after everything the packet declares was read.
    pub(crate) fn too_long() -> Self {
        Self::malformed("remaining length too long")
    }

    /// Fewer bytes than the packet needs.
    pub(crate) fn too_short() -> Self {
        Self::malformed("remaining length too short")
    }
}

/// Error type for the async read adapter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Connection closed by peer.
    #[error("connection closed")]
    ConnectionClosed,

    /// The peer sent an invalid packet. The fault carries the DISCONNECT to send.
    #[error("decode fault: {0}")]
    Decode(#[from] Fault),

    /// A previous fault terminated decoding on this connection.
    #[error("decoder terminated by an earlier fault")]
    Terminated,
}
