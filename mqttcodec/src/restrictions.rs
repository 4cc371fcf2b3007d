//! Negotiated connection limits.
//!
//! [`ConnectRestrictions`] are the limits the client announced in its
//! CONNECT and therefore enforces on inbound packets. [`ConnAckRestrictions`]
//! are the limits the server announced in its CONNACK.

use serde::{Deserialize, Serialize};

use crate::types::QoS;

/// Largest possible packet: 1 type byte, 4 length bytes, maximum remaining
/// length. Used to mean "no limit".
pub const MAXIMUM_PACKET_SIZE_LIMIT: u32 = 268_435_460;

pub const DEFAULT_RECEIVE_MAXIMUM: u16 = u16::MAX;

pub const DEFAULT_TOPIC_ALIAS_MAXIMUM: u16 = 0;

/// Limits announced by the client in CONNECT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectRestrictions {
    /// Maximum number of concurrent QoS 1/2 publishes the client accepts.
    ///
    /// Not checked while decoding: in-flight publishes are counted by the
    /// session layer, which reads the value back through
    /// [`Decoder::config`](crate::Decoder::config).
    pub receive_maximum: u16,
    /// Largest inbound packet, fixed header included.
    pub maximum_packet_size: u32,
    /// Number of inbound topic aliases the client keeps.
    pub topic_alias_maximum: u16,
    /// Whether the server may send reason strings and user properties on
    /// packets other than PUBLISH, CONNACK and DISCONNECT.
    pub request_problem_information: bool,
    /// Whether the server may send response information in CONNACK.
    pub request_response_information: bool,
}

impl Default for ConnectRestrictions {
    fn default() -> Self {
        Self {
            receive_maximum: DEFAULT_RECEIVE_MAXIMUM,
            maximum_packet_size: MAXIMUM_PACKET_SIZE_LIMIT,
            topic_alias_maximum: DEFAULT_TOPIC_ALIAS_MAXIMUM,
            request_problem_information: true,
            request_response_information: false,
        }
    }
}

/// Limits announced by the server in CONNACK. Absent properties keep their
/// protocol defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnAckRestrictions {
    pub receive_maximum: u16,
    pub maximum_packet_size: u32,
    pub topic_alias_maximum: u16,
    pub maximum_qos: QoS,
    pub retain_available: bool,
    pub wildcard_subscription_available: bool,
    pub subscription_identifiers_available: bool,
    pub shared_subscription_available: bool,
}

impl Default for ConnAckRestrictions {
    fn default() -> Self {
        Self {
            receive_maximum: DEFAULT_RECEIVE_MAXIMUM,
            maximum_packet_size: MAXIMUM_PACKET_SIZE_LIMIT,
            topic_alias_maximum: DEFAULT_TOPIC_ALIAS_MAXIMUM,
            maximum_qos: QoS::ExactlyOnce,
            retain_available: true,
            wildcard_subscription_available: true,
            subscription_identifiers_available: true,
            shared_subscription_available: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connack_defaults() {
        let r = ConnAckRestrictions::default();
        assert_eq!(r.receive_maximum, 65535);
        assert_eq!(r.topic_alias_maximum, 0);
        assert_eq!(r.maximum_qos, QoS::ExactlyOnce);
        assert_eq!(r.maximum_packet_size, MAXIMUM_PACKET_SIZE_LIMIT);
        assert!(r.retain_available);
        assert!(r.wildcard_subscription_available);
        assert!(r.subscription_identifiers_available);
        assert!(r.shared_subscription_available);
    }

    #[test]
    fn test_connect_restrictions_partial_deserialize() {
        let r: ConnectRestrictions = serde_json::from_str(r#"{"topic_alias_maximum": 8}"#).unwrap();
        assert_eq!(r.topic_alias_maximum, 8);
        assert_eq!(r.maximum_packet_size, MAXIMUM_PACKET_SIZE_LIMIT);
        assert!(r.request_problem_information);
    }
}
