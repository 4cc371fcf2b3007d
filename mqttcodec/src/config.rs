//! Decoder configuration.

use serde::{Deserialize, Serialize};

use crate::restrictions::ConnectRestrictions;
use crate::types::ProtocolVersion;

/// Per-connection decoder configuration.
///
/// Mirrors what the client negotiated in its CONNECT. Built with the
/// `with_*` methods or deserialized from the host's own config format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Protocol version of the connection.
    pub protocol_version: ProtocolVersion,
    /// Limits announced in CONNECT.
    pub restrictions: ConnectRestrictions,
    /// Include a reason string in the DISCONNECT sent after a decode fault.
    pub send_reason_string: bool,
    /// Reject PUBLISH payloads flagged as UTF-8 that are not valid UTF-8.
    pub validate_payload_format: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::new(ProtocolVersion::V5)
    }
}

impl DecoderConfig {
    /// Create a config with protocol default restrictions.
    pub fn new(protocol_version: ProtocolVersion) -> Self {
        Self {
            protocol_version,
            restrictions: ConnectRestrictions::default(),
            send_reason_string: true,
            validate_payload_format: false,
        }
    }

    /// Set the maximum inbound packet size.
    pub fn with_maximum_packet_size(mut self, size: u32) -> Self {
        self.restrictions.maximum_packet_size = size;
        self
    }

    /// Set the number of inbound topic aliases.
    pub fn with_topic_alias_maximum(mut self, maximum: u16) -> Self {
        self.restrictions.topic_alias_maximum = maximum;
        self
    }

    /// Set the receive maximum announced in CONNECT.
    ///
    /// Carried for the session layer; the decoder itself does not count
    /// in-flight publishes.
    pub fn with_receive_maximum(mut self, maximum: u16) -> Self {
        self.restrictions.receive_maximum = maximum;
        self
    }

    /// Whether problem information (reason strings, user properties) was
    /// requested in CONNECT.
    pub fn with_request_problem_information(mut self, requested: bool) -> Self {
        self.restrictions.request_problem_information = requested;
        self
    }

    /// Whether response information was requested in CONNECT.
    pub fn with_request_response_information(mut self, requested: bool) -> Self {
        self.restrictions.request_response_information = requested;
        self
    }

    /// Enable or disable the reason string on fault DISCONNECTs.
    pub fn with_send_reason_string(mut self, enabled: bool) -> Self {
        self.send_reason_string = enabled;
        self
    }

    /// Enable or disable UTF-8 validation of payloads flagged as UTF-8.
    pub fn with_validate_payload_format(mut self, enabled: bool) -> Self {
        self.validate_payload_format = enabled;
        self
    }
}
