//! Per-connection decode driver.
//!
//! [`Decoder`] owns everything a connection needs to turn inbound bytes into
//! packets: the dispatch table for its protocol version, the negotiated
//! restrictions and the inbound topic alias table. Every frame is decoded in
//! one fault scope. A fault discards the frame, produces the DISCONNECT to
//! send and terminates decoding for the rest of the connection.

use std::mem;

use bytes::BytesMut;
use tracing::{debug, trace, warn};

use crate::config::DecoderConfig;
use crate::dispatch::{DecodeContext, DispatchError, Dispatcher};
use crate::error::DecodeError;
use crate::frame::{read_fixed_header, split_frame};
use crate::packet::{Disconnect, Packet};
use crate::reason::{ConnAckReasonCode, DisconnectReasonCode};
use crate::restrictions::ConnAckRestrictions;
use crate::topic::TopicAliasTable;
use crate::types::{FixedHeader, MqttString};

/// Where the decoder is in the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Fewer bytes than the fixed header needs.
    AwaitingHeader,
    /// Header known, body not complete yet.
    AwaitingBody,
    /// A complete frame is being decoded.
    Decoding,
    /// The last frame produced a packet.
    Emitted,
    /// A fault terminated the connection. Terminal.
    Faulted,
}

/// A decode fault and the DISCONNECT it produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{error}")]
pub struct Fault {
    pub error: DecodeError,
    /// DISCONNECT to send before closing the connection.
    pub disconnect: Disconnect,
}

impl Fault {
    pub fn reason_code(&self) -> DisconnectReasonCode {
        self.error.reason_code
    }
}

/// Output of one [`Decoder::feed`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feed {
    /// Packets decoded from the input, in wire order.
    pub packets: Vec<Packet>,
    /// Set when the input ended in a fault.
    pub disconnect: Option<Disconnect>,
}

/// Incremental decoder for one client connection.
pub struct Decoder {
    config: DecoderConfig,
    dispatcher: Dispatcher,
    context: DecodeContext,
    state: DecoderState,
    fault: Option<Fault>,
    buf: BytesMut,
}

impl Decoder {
    pub fn new(config: DecoderConfig) -> Self {
        let context = DecodeContext {
            restrictions: config.restrictions.clone(),
            server_restrictions: None,
            topic_aliases: TopicAliasTable::new(config.restrictions.topic_alias_maximum),
            validate_payload_format: config.validate_payload_format,
        };
        Self {
            dispatcher: Dispatcher::new(config.protocol_version),
            config,
            context,
            state: DecoderState::AwaitingHeader,
            fault: None,
            buf: BytesMut::new(),
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Whether a fault has ended decoding on this connection.
    pub fn is_terminated(&self) -> bool {
        self.state == DecoderState::Faulted
    }

    /// The fault that terminated the connection, if any.
    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    /// Restrictions from the last successful CONNACK.
    pub fn server_restrictions(&self) -> Option<&ConnAckRestrictions> {
        self.context.server_restrictions.as_ref()
    }

    pub fn topic_aliases(&self) -> &TopicAliasTable {
        &self.context.topic_aliases
    }

    /// Bytes held by [`feed`](Self::feed) that do not form a packet yet.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Decode at most one packet from the front of `src`.
    ///
    /// Returns `Ok(None)` when more bytes are needed; nothing is consumed in
    /// that case. A complete frame is split off `src` before it is decoded.
    /// On a fault the rest of `src` is dropped as well, and later calls
    /// discard their input.
    pub fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, Fault> {
        if self.is_terminated() {
            if !src.is_empty() {
                warn!("Discarding {} bytes received after decode fault", src.len());
                src.clear();
            }
            return Ok(None);
        }

        let header = match read_fixed_header(src) {
            Ok(Some(header)) => header,
            Ok(None) => {
                self.state = DecoderState::AwaitingHeader;
                return Ok(None);
            }
            Err(e) => {
                let message = e.message.clone();
                return Err(self.fail(e, message, src));
            }
        };

        let maximum = self.context.restrictions.maximum_packet_size as usize;
        if header.frame_length() > maximum {
            let message = "incoming packet exceeded maximum packet size";
            let error = DecodeError::new(DisconnectReasonCode::PacketTooLarge, message);
            return Err(self.fail(error, message.to_owned(), src));
        }

        let Some(frame) = split_frame(src, header) else {
            self.state = DecoderState::AwaitingBody;
            return Ok(None);
        };

        self.state = DecoderState::Decoding;
        match self.dispatcher.decode(&frame.header, frame.body, &self.context) {
            Ok(packet) => {
                trace!("Decoded {} ({} bytes)", packet.packet_type(), header.frame_length());
                self.commit(&packet);
                self.state = DecoderState::Emitted;
                Ok(Some(packet))
            }
            Err(DispatchError::Unexpected(e)) => {
                let message = e.message.clone();
                Err(self.fail(e, message, src))
            }
            Err(DispatchError::Decode(e)) => {
                let message = format!("Exception while decoding {}: {}", type_name(&header), e.message);
                Err(self.fail(e, message, src))
            }
        }
    }

    /// Append `data` and decode every complete packet it finishes.
    ///
    /// Incomplete trailing bytes stay buffered for the next call.
    pub fn feed(&mut self, data: &[u8]) -> Feed {
        let mut buf = mem::take(&mut self.buf);
        buf.extend_from_slice(data);

        let mut feed = Feed::default();
        loop {
            match self.decode(&mut buf) {
                Ok(Some(packet)) => feed.packets.push(packet),
                Ok(None) => break,
                Err(fault) => {
                    feed.disconnect = Some(fault.disconnect);
                    break;
                }
            }
        }

        self.buf = buf;
        feed
    }

    /// Apply the connection state changes carried by an accepted packet.
    fn commit(&mut self, packet: &Packet) {
        match packet {
            Packet::Publish(publish) => {
                if let Some(alias) = publish.topic_alias.filter(|alias| alias.new_mapping) {
                    self.context.topic_aliases.set(alias.alias, publish.message.topic.clone());
                }
            }
            Packet::ConnAck(connack) if connack.reason_code == ConnAckReasonCode::Success => {
                self.context.server_restrictions = Some(connack.restrictions.clone());
            }
            _ => {}
        }
    }

    fn fail(&mut self, error: DecodeError, reason_string: String, src: &mut BytesMut) -> Fault {
        debug!("Decode fault: {:?}: {}", error.reason_code, error.message);

        let mut disconnect = Disconnect::new(error.reason_code);
        if self.config.send_reason_string {
            if let Some(reason_string) = MqttString::new(reason_string) {
                disconnect = disconnect.with_reason_string(reason_string);
            }
        }

        src.clear();
        self.state = DecoderState::Faulted;
        let fault = Fault { error, disconnect };
        self.fault = Some(fault.clone());
        fault
    }
}

fn type_name(header: &FixedHeader) -> String {
    match header.packet_type() {
        Some(packet_type) => packet_type.to_string(),
        None => header.type_code.to_string(),
    }
}
