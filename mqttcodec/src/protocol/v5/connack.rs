//! CONNACK decoder.

use bytes::{Buf, Bytes};

use super::super::codec;
use super::super::ensure_consumed;
use super::super::property::{decode_properties, property_id, ReasonProperties};
use crate::dispatch::DecodeContext;
use crate::error::{DecodeError, DecodeResult};
use crate::packet::{ConnAck, EnhancedAuth, Packet};
use crate::reason::ConnAckReasonCode;
use crate::restrictions::ConnAckRestrictions;
use crate::types::{FixedHeader, MqttString, QoS};

/// MQTT 3.1.1 "unacceptable protocol version" return code. A 3.1.1 server
/// answers a 5.0 CONNECT with it in a 2 byte CONNACK.
const MQTT3_UNSUPPORTED_PROTOCOL_VERSION: u8 = 0x01;

#[derive(Default)]
struct Properties {
    session_expiry_interval: Option<u32>,
    receive_maximum: Option<u16>,
    maximum_qos: Option<u8>,
    retain_available: Option<bool>,
    maximum_packet_size: Option<u32>,
    assigned_client_identifier: Option<MqttString>,
    topic_alias_maximum: Option<u16>,
    wildcard_subscription_available: Option<bool>,
    subscription_identifiers_available: Option<bool>,
    shared_subscription_available: Option<bool>,
    server_keep_alive: Option<u16>,
    response_information: Option<MqttString>,
    server_reference: Option<MqttString>,
    auth_method: Option<MqttString>,
    auth_data: Option<Bytes>,
    reason: ReasonProperties,
}

impl Properties {
    fn decode(&mut self, id: u32, buf: &mut Bytes, ctx: &DecodeContext) -> DecodeResult<()> {
        match id {
            property_id::SESSION_EXPIRY_INTERVAL => {
                codec::u32_only_once(&mut self.session_expiry_interval, "session expiry interval", buf)?;
            }
            property_id::RECEIVE_MAXIMUM => {
                codec::non_zero_u16_only_once(&mut self.receive_maximum, "receive maximum", buf)?;
            }
            property_id::MAXIMUM_QOS => {
                let qos = codec::u8_only_once(&mut self.maximum_qos, "maximum QoS", buf)?;
                if qos > 1 {
                    return Err(DecodeError::protocol(format!("wrong maximum QoS: {qos}")));
                }
            }
            property_id::RETAIN_AVAILABLE => {
                codec::boolean_only_once(&mut self.retain_available, "retain available", buf)?;
            }
            property_id::MAXIMUM_PACKET_SIZE => {
                codec::non_zero_u32_only_once(&mut self.maximum_packet_size, "maximum packet size", buf)?;
            }
            property_id::ASSIGNED_CLIENT_IDENTIFIER => {
                codec::utf8_only_once(&mut self.assigned_client_identifier, "assigned client identifier", buf)?;
            }
            property_id::TOPIC_ALIAS_MAXIMUM => {
                codec::u16_only_once(&mut self.topic_alias_maximum, "topic alias maximum", buf)?;
            }
            property_id::WILDCARD_SUBSCRIPTION_AVAILABLE => {
                codec::boolean_only_once(
                    &mut self.wildcard_subscription_available,
                    "wildcard subscription available",
                    buf,
                )?;
            }
            property_id::SUBSCRIPTION_IDENTIFIERS_AVAILABLE => {
                codec::boolean_only_once(
                    &mut self.subscription_identifiers_available,
                    "subscription identifiers available",
                    buf,
                )?;
            }
            property_id::SHARED_SUBSCRIPTION_AVAILABLE => {
                codec::boolean_only_once(
                    &mut self.shared_subscription_available,
                    "shared subscription available",
                    buf,
                )?;
            }
            property_id::SERVER_KEEP_ALIVE => {
                codec::u16_only_once(&mut self.server_keep_alive, "server keep alive", buf)?;
            }
            property_id::RESPONSE_INFORMATION => {
                if !ctx.restrictions.request_response_information {
                    return Err(DecodeError::protocol(
                        "response information must not be included if it was not requested",
                    ));
                }
                codec::utf8_only_once(&mut self.response_information, "response information", buf)?;
            }
            property_id::SERVER_REFERENCE => {
                codec::utf8_only_once(&mut self.server_reference, "server reference", buf)?;
            }
            property_id::AUTHENTICATION_METHOD => {
                codec::utf8_only_once(&mut self.auth_method, "auth method", buf)?;
            }
            property_id::AUTHENTICATION_DATA => {
                codec::binary_only_once(&mut self.auth_data, "auth data", buf)?;
            }
            // CONNACK may always carry problem information.
            _ if self.reason.decode(id, buf, true)? => {}
            _ => return Err(DecodeError::wrong_property(id)),
        }
        Ok(())
    }

    fn restrictions(&self) -> ConnAckRestrictions {
        let defaults = ConnAckRestrictions::default();
        ConnAckRestrictions {
            receive_maximum: self.receive_maximum.unwrap_or(defaults.receive_maximum),
            maximum_packet_size: self.maximum_packet_size.unwrap_or(defaults.maximum_packet_size),
            topic_alias_maximum: self.topic_alias_maximum.unwrap_or(defaults.topic_alias_maximum),
            maximum_qos: self.maximum_qos.and_then(QoS::from_u8).unwrap_or(defaults.maximum_qos),
            retain_available: self.retain_available.unwrap_or(defaults.retain_available),
            wildcard_subscription_available: self
                .wildcard_subscription_available
                .unwrap_or(defaults.wildcard_subscription_available),
            subscription_identifiers_available: self
                .subscription_identifiers_available
                .unwrap_or(defaults.subscription_identifiers_available),
            shared_subscription_available: self
                .shared_subscription_available
                .unwrap_or(defaults.shared_subscription_available),
        }
    }
}

pub(crate) fn decode(_: &FixedHeader, mut body: Bytes, ctx: &DecodeContext) -> DecodeResult<Packet> {
    if body.len() == 2 && body[1] == MQTT3_UNSUPPORTED_PROTOCOL_VERSION {
        return Ok(Packet::ConnAck(ConnAck::new(ConnAckReasonCode::UnsupportedProtocolVersion, false)));
    }
    // Ack flags, reason code, properties length.
    if body.len() < 3 {
        return Err(DecodeError::too_short());
    }

    let flags = body.get_u8();
    if flags & 0xFE != 0 {
        return Err(DecodeError::malformed("wrong CONNACK flags"));
    }
    let session_present = flags & 0x01 != 0;

    let code = body.get_u8();
    let reason_code = ConnAckReasonCode::from_u8(code).ok_or_else(|| DecodeError::wrong_reason_code(code))?;
    if session_present && reason_code != ConnAckReasonCode::Success {
        return Err(DecodeError::malformed("session present must be 0 if reason code is not SUCCESS"));
    }

    let mut props = Properties::default();
    decode_properties(&mut body, |id, buf| props.decode(id, buf, ctx))?;
    ensure_consumed(&body)?;

    if props.auth_method.is_none() && props.auth_data.is_some() {
        return Err(DecodeError::protocol("auth data must not be included if auth method is absent"));
    }

    let restrictions = props.restrictions();
    let enhanced_auth = props.auth_method.map(|method| EnhancedAuth {
        method,
        data: props.auth_data,
    });

    Ok(Packet::ConnAck(ConnAck {
        reason_code,
        session_present,
        session_expiry_interval: props.session_expiry_interval,
        assigned_client_identifier: props.assigned_client_identifier,
        server_keep_alive: props.server_keep_alive,
        restrictions,
        response_information: props.response_information,
        server_reference: props.server_reference,
        enhanced_auth,
        reason_string: props.reason.reason_string,
        user_properties: props.reason.user_properties,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reason::DisconnectReasonCode;
    use crate::testing::{decode as run, decode_with as run_with, prefixed_property, with_properties};

    fn connack(packet: Packet) -> ConnAck {
        match packet {
            Packet::ConnAck(connack) => connack,
            other => panic!("Expected ConnAck, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let connack = connack(run(decode, 0x20, &[0x00, 0x00, 0x00]).unwrap());
        assert_eq!(connack.reason_code, ConnAckReasonCode::Success);
        assert!(!connack.session_present);
        assert_eq!(connack.restrictions, ConnAckRestrictions::default());
        assert!(connack.enhanced_auth.is_none());
        assert!(connack.user_properties.is_empty());
    }

    #[test]
    fn test_session_present_with_failure() {
        let err = run(decode, 0x20, &[0x01, 0x87, 0x00]).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::MalformedPacket);

        let connack = connack(run(decode, 0x20, &[0x01, 0x00, 0x00]).unwrap());
        assert!(connack.session_present);
    }

    #[test]
    fn test_wrong_flags_and_reason_code() {
        let err = run(decode, 0x20, &[0x02, 0x00, 0x00]).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::MalformedPacket);

        let err = run(decode, 0x20, &[0x00, 0x10, 0x00]).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::MalformedPacket);
        assert!(err.message.starts_with("wrong reason code"));
    }

    #[test]
    fn test_mqtt3_fallback() {
        let connack = connack(run(decode, 0x20, &[0x00, 0x01]).unwrap());
        assert_eq!(connack.reason_code, ConnAckReasonCode::UnsupportedProtocolVersion);

        let err = run(decode, 0x20, &[0x00, 0x00]).unwrap_err();
        assert_eq!(err.message, "remaining length too short");
    }

    #[test]
    fn test_zero_values() {
        for property in [&[0x21, 0x00, 0x00][..], &[0x27, 0x00, 0x00, 0x00, 0x00][..]] {
            let err = run(decode, 0x20, &with_properties(&[0, 0], property, &[])).unwrap_err();
            assert_eq!(err.reason_code, DisconnectReasonCode::ProtocolError);
        }
    }

    #[test]
    fn test_maximum_qos() {
        let connack = connack(run(decode, 0x20, &with_properties(&[0, 0], &[0x24, 0x00], &[])).unwrap());
        assert_eq!(connack.restrictions.maximum_qos, QoS::AtMostOnce);

        let err = run(decode, 0x20, &with_properties(&[0, 0], &[0x24, 0x02], &[])).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::ProtocolError);
    }

    #[test]
    fn test_boolean_out_of_range() {
        let err = run(decode, 0x20, &with_properties(&[0, 0], &[0x25, 0x02], &[])).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::ProtocolError);
    }

    #[test]
    fn test_auth_data_without_method() {
        let props = prefixed_property(0x16, &[1, 2, 3]);
        let err = run(decode, 0x20, &with_properties(&[0, 0], &props, &[])).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::ProtocolError);
    }

    #[test]
    fn test_response_information_requires_request() {
        let props = prefixed_property(0x1A, b"response");
        let body = with_properties(&[0, 0], &props, &[]);

        let err = run(decode, 0x20, &body).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::ProtocolError);

        let mut ctx = DecodeContext::default();
        ctx.restrictions.request_response_information = true;
        let connack = connack(run_with(decode, 0x20, &body, &ctx).unwrap());
        assert_eq!(connack.response_information.unwrap(), "response");
    }

    #[test]
    fn test_client_only_property() {
        // Request problem information is sent by clients only.
        let err = run(decode, 0x20, &with_properties(&[0, 0], &[0x17, 0x01], &[])).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::MalformedPacket);
    }

    #[test]
    fn test_payload_not_allowed() {
        let err = run(decode, 0x20, &with_properties(&[0, 0], &[], &[0x00])).unwrap_err();
        assert_eq!(err.message, "remaining length too long");
    }
}
