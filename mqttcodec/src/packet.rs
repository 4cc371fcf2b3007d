//! Decoded control packets.
//!
//! Every packet is built once by its decoder, fully populated, and never
//! mutated afterwards. MQTT 3.1.1 packets decode into the same types with
//! the MQTT 5.0 only fields left at their defaults.

use bytes::Bytes;

use crate::reason::{
    AuthReasonCode, ConnAckReasonCode, DisconnectReasonCode, PubAckReasonCode, PubRelReasonCode,
    SubAckReasonCode, UnsubAckReasonCode,
};
use crate::restrictions::ConnAckRestrictions;
use crate::types::{MqttString, PacketType, PayloadFormat, QoS, UserProperty};

/// A decoded control packet, one variant per packet type a client receives.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    ConnAck(ConnAck),
    Publish(Publish),
    PubAck(PubAck),
    PubRec(PubRec),
    PubRel(PubRel),
    PubComp(PubComp),
    SubAck(SubAck),
    UnsubAck(UnsubAck),
    PingResp,
    Disconnect(Disconnect),
    Auth(Auth),
}

impl Packet {
    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::ConnAck(_) => PacketType::ConnAck,
            Packet::Publish(_) => PacketType::Publish,
            Packet::PubAck(_) => PacketType::PubAck,
            Packet::PubRec(_) => PacketType::PubRec,
            Packet::PubRel(_) => PacketType::PubRel,
            Packet::PubComp(_) => PacketType::PubComp,
            Packet::SubAck(_) => PacketType::SubAck,
            Packet::UnsubAck(_) => PacketType::UnsubAck,
            Packet::PingResp => PacketType::PingResp,
            Packet::Disconnect(_) => PacketType::Disconnect,
            Packet::Auth(_) => PacketType::Auth,
        }
    }
}

// ============================================================================
// CONNACK
// ============================================================================

/// Enhanced authentication method and data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancedAuth {
    pub method: MqttString,
    pub data: Option<Bytes>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnAck {
    pub reason_code: ConnAckReasonCode,
    pub session_present: bool,
    pub session_expiry_interval: Option<u32>,
    pub assigned_client_identifier: Option<MqttString>,
    pub server_keep_alive: Option<u16>,
    /// Server limits, protocol defaults where the property was absent.
    pub restrictions: ConnAckRestrictions,
    pub response_information: Option<MqttString>,
    pub server_reference: Option<MqttString>,
    pub enhanced_auth: Option<EnhancedAuth>,
    pub reason_string: Option<MqttString>,
    pub user_properties: Vec<UserProperty>,
}

impl ConnAck {
    /// A CONNACK with no properties.
    pub fn new(reason_code: ConnAckReasonCode, session_present: bool) -> Self {
        Self {
            reason_code,
            session_present,
            session_expiry_interval: None,
            assigned_client_identifier: None,
            server_keep_alive: None,
            restrictions: ConnAckRestrictions::default(),
            response_information: None,
            server_reference: None,
            enhanced_auth: None,
            reason_string: None,
            user_properties: Vec::new(),
        }
    }
}

// ============================================================================
// PUBLISH
// ============================================================================

/// The application visible part of a PUBLISH.
///
/// Connection-local details (packet identifier, DUP, topic alias,
/// subscription identifiers) live on [`Publish`].
#[derive(Debug, Clone, PartialEq)]
pub struct PublishMessage {
    /// Topic name, resolved through the topic alias table when the packet
    /// only carried an alias.
    pub topic: MqttString,
    pub payload: Bytes,
    pub qos: QoS,
    pub retain: bool,
    pub message_expiry_interval: Option<u32>,
    pub payload_format: Option<PayloadFormat>,
    pub content_type: Option<MqttString>,
    pub response_topic: Option<MqttString>,
    pub correlation_data: Option<Bytes>,
    pub user_properties: Vec<UserProperty>,
}

impl PublishMessage {
    /// A message without MQTT 5.0 properties.
    pub fn new(topic: MqttString, payload: Bytes, qos: QoS, retain: bool) -> Self {
        Self {
            topic,
            payload,
            qos,
            retain,
            message_expiry_interval: None,
            payload_format: None,
            content_type: None,
            response_topic: None,
            correlation_data: None,
            user_properties: Vec::new(),
        }
    }
}

/// Topic alias carried by a PUBLISH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicAlias {
    pub alias: u16,
    /// The packet carried both a topic name and the alias, so the alias is
    /// (re)mapped to that topic once the packet is accepted.
    pub new_mapping: bool,
}

/// A PUBLISH as seen by the connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Publish {
    pub message: PublishMessage,
    /// Present iff QoS > 0.
    pub packet_id: Option<u16>,
    pub dup: bool,
    pub topic_alias: Option<TopicAlias>,
    pub subscription_identifiers: Vec<u32>,
}

impl Publish {
    /// The stateless message handed to the application.
    pub fn message(&self) -> &PublishMessage {
        &self.message
    }

    pub fn into_message(self) -> PublishMessage {
        self.message
    }
}

// ============================================================================
// PUBACK / PUBREC / PUBREL / PUBCOMP
// ============================================================================

/// Acknowledgement in the QoS 1/2 flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishAck<R> {
    pub packet_id: u16,
    pub reason_code: R,
    pub reason_string: Option<MqttString>,
    pub user_properties: Vec<UserProperty>,
}

impl<R> PublishAck<R> {
    pub fn new(packet_id: u16, reason_code: R) -> Self {
        Self {
            packet_id,
            reason_code,
            reason_string: None,
            user_properties: Vec::new(),
        }
    }
}

pub type PubAck = PublishAck<PubAckReasonCode>;
pub type PubRec = PublishAck<PubAckReasonCode>;
pub type PubRel = PublishAck<PubRelReasonCode>;
pub type PubComp = PublishAck<PubRelReasonCode>;

// ============================================================================
// SUBACK / UNSUBACK
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubAck {
    pub packet_id: u16,
    /// One per topic filter of the SUBSCRIBE, in order.
    pub reason_codes: Vec<SubAckReasonCode>,
    pub reason_string: Option<MqttString>,
    pub user_properties: Vec<UserProperty>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsubAck {
    pub packet_id: u16,
    /// One per topic filter of the UNSUBSCRIBE. Empty for MQTT 3.1.1.
    pub reason_codes: Vec<UnsubAckReasonCode>,
    pub reason_string: Option<MqttString>,
    pub user_properties: Vec<UserProperty>,
}

// ============================================================================
// DISCONNECT / AUTH
// ============================================================================

/// DISCONNECT, either received from the server or built by the decoder
/// after a fault.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Disconnect {
    pub reason_code: DisconnectReasonCode,
    pub session_expiry_interval: Option<u32>,
    pub server_reference: Option<MqttString>,
    pub reason_string: Option<MqttString>,
    pub user_properties: Vec<UserProperty>,
}

impl Disconnect {
    pub fn new(reason_code: DisconnectReasonCode) -> Self {
        Self {
            reason_code,
            ..Default::default()
        }
    }

    /// Set the reason string.
    pub fn with_reason_string(mut self, reason_string: MqttString) -> Self {
        self.reason_string = Some(reason_string);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auth {
    pub reason_code: AuthReasonCode,
    pub method: MqttString,
    pub data: Option<Bytes>,
    pub reason_string: Option<MqttString>,
    pub user_properties: Vec<UserProperty>,
}
