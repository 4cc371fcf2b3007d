//! Packet type dispatch.
//!
//! A fixed table from the type nibble to the decoder for that packet type,
//! built once per connection for its protocol version. Only packet types a
//! client may receive are registered.

use bytes::Bytes;

use crate::error::{DecodeError, DecodeResult};
use crate::packet::Packet;
use crate::protocol::{v4, v5};
use crate::restrictions::{ConnAckRestrictions, ConnectRestrictions};
use crate::topic::TopicAliasTable;
use crate::types::{FixedHeader, PacketType, ProtocolVersion};

/// Per-connection state the packet decoders read.
///
/// Decoders only ever get a shared reference; the decode driver applies
/// updates after a packet was accepted.
#[derive(Debug, Clone, Default)]
pub struct DecodeContext {
    /// Limits the client announced in CONNECT.
    pub restrictions: ConnectRestrictions,
    /// Limits from the server's CONNACK, once received.
    pub server_restrictions: Option<ConnAckRestrictions>,
    pub topic_aliases: TopicAliasTable,
    pub validate_payload_format: bool,
}

/// Signature shared by all packet decoders. `body` is exactly the
/// remaining-length bytes of the frame.
pub type DecodeFn = fn(&FixedHeader, Bytes, &DecodeContext) -> DecodeResult<Packet>;

#[derive(Clone, Copy)]
struct Entry {
    decode: DecodeFn,
    /// Required flags nibble, `None` if the decoder checks the flags itself.
    flags: Option<u8>,
}

impl Entry {
    fn new(decode: DecodeFn) -> Self {
        Self { decode, flags: Some(0b0000) }
    }

    fn with_flags(decode: DecodeFn, flags: Option<u8>) -> Self {
        Self { decode, flags }
    }
}

/// Maps wire packet types to decoders.
#[derive(Clone)]
pub struct Dispatcher {
    version: ProtocolVersion,
    entries: [Option<Entry>; 16],
}

impl Dispatcher {
    /// Build the client table for `version`.
    pub fn new(version: ProtocolVersion) -> Self {
        let mut entries: [Option<Entry>; 16] = [None; 16];
        let mut register = |packet_type: PacketType, entry: Entry| {
            entries[packet_type as usize] = Some(entry);
        };

        match version {
            ProtocolVersion::V4 => {
                register(PacketType::ConnAck, Entry::new(v4::decode_connack));
                register(PacketType::Publish, Entry::with_flags(v4::decode_publish, None));
                register(PacketType::PubAck, Entry::new(v4::decode_puback));
                register(PacketType::PubRec, Entry::new(v4::decode_pubrec));
                register(PacketType::PubRel, Entry::with_flags(v4::decode_pubrel, Some(0b0010)));
                register(PacketType::PubComp, Entry::new(v4::decode_pubcomp));
                register(PacketType::SubAck, Entry::new(v4::decode_suback));
                register(PacketType::UnsubAck, Entry::new(v4::decode_unsuback));
                register(PacketType::PingResp, Entry::new(v4::decode_pingresp));
            }
            ProtocolVersion::V5 => {
                register(PacketType::ConnAck, Entry::new(v5::connack::decode));
                register(PacketType::Publish, Entry::with_flags(v5::publish::decode, None));
                register(PacketType::PubAck, Entry::new(v5::ack::decode_puback));
                register(PacketType::PubRec, Entry::new(v5::ack::decode_pubrec));
                register(PacketType::PubRel, Entry::with_flags(v5::ack::decode_pubrel, Some(0b0010)));
                register(PacketType::PubComp, Entry::new(v5::ack::decode_pubcomp));
                register(PacketType::SubAck, Entry::new(v5::suback::decode_suback));
                register(PacketType::UnsubAck, Entry::new(v5::suback::decode_unsuback));
                register(PacketType::PingResp, Entry::new(v4::decode_pingresp));
                register(PacketType::Disconnect, Entry::new(v5::disconnect::decode));
                register(PacketType::Auth, Entry::new(v5::auth::decode));
            }
        }

        Self { version, entries }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Whether a decoder is registered for the type nibble `type_code`.
    pub fn is_registered(&self, type_code: u8) -> bool {
        self.entries.get(type_code as usize).is_some_and(Option::is_some)
    }

    /// Decode one frame body.
    ///
    /// Unregistered types fail before the decoder runs, so the error is
    /// reported as [`DispatchError::Unexpected`].
    pub fn decode(&self, header: &FixedHeader, body: Bytes, ctx: &DecodeContext) -> Result<Packet, DispatchError> {
        let entry = self
            .entries
            .get(header.type_code as usize)
            .copied()
            .flatten()
            .ok_or_else(|| {
                DispatchError::Unexpected(DecodeError::protocol(format!(
                    "must not receive this packet type: {}",
                    header.type_code
                )))
            })?;

        if let Some(flags) = entry.flags {
            if header.flags != flags {
                return Err(DispatchError::Decode(DecodeError::malformed(format!(
                    "wrong flags: {:#06b}",
                    header.flags
                ))));
            }
        }

        (entry.decode)(header, body, ctx).map_err(DispatchError::Decode)
    }
}

/// Where in dispatch a fault was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No decoder for the packet type.
    Unexpected(DecodeError),
    /// The decoder for the packet type rejected the frame.
    Decode(DecodeError),
}

impl DispatchError {
    pub fn into_inner(self) -> DecodeError {
        match self {
            DispatchError::Unexpected(e) | DispatchError::Decode(e) => e,
        }
    }
}
