//! PUBLISH decoder.
//!
//! Besides the properties, PUBLISH is where topic aliases are resolved. The
//! decoder only reads the alias table; a new mapping is reported through
//! [`TopicAlias::new_mapping`] and applied by the decode driver once the
//! whole packet has been accepted.

use bytes::Bytes;

use super::super::property::{decode_properties, property_id};
use super::super::{codec, publish_flags, publish_packet_id};
use crate::dispatch::DecodeContext;
use crate::error::{DecodeError, DecodeResult};
use crate::packet::{Packet, Publish, PublishMessage, TopicAlias};
use crate::reason::DisconnectReasonCode;
use crate::topic::read_topic_name;
use crate::types::{FixedHeader, MqttString, PayloadFormat, UserProperty};

/// Topic length and properties length.
const MIN_REMAINING_LENGTH: usize = 3;

#[derive(Default)]
struct Properties {
    message_expiry_interval: Option<u32>,
    payload_format: Option<u8>,
    content_type: Option<MqttString>,
    response_topic: Option<MqttString>,
    correlation_data: Option<Bytes>,
    topic_alias: Option<u16>,
    subscription_identifiers: Vec<u32>,
    user_properties: Vec<UserProperty>,
}

impl Properties {
    fn decode(&mut self, id: u32, buf: &mut Bytes) -> DecodeResult<()> {
        match id {
            property_id::MESSAGE_EXPIRY_INTERVAL => {
                codec::u32_only_once(&mut self.message_expiry_interval, "message expiry interval", buf)?;
            }
            property_id::PAYLOAD_FORMAT_INDICATOR => {
                let indicator = codec::u8_only_once(&mut self.payload_format, "payload format indicator", buf)?;
                if PayloadFormat::from_u8(indicator).is_none() {
                    return Err(DecodeError::malformed(format!(
                        "wrong payload format indicator: {indicator}"
                    )));
                }
            }
            property_id::CONTENT_TYPE => {
                codec::utf8_only_once(&mut self.content_type, "content type", buf)?;
            }
            property_id::RESPONSE_TOPIC => {
                if self.response_topic.is_some() {
                    return Err(DecodeError::more_than_once("response topic"));
                }
                let topic = read_topic_name(buf, "response topic")?.ok_or_else(|| {
                    DecodeError::new(DisconnectReasonCode::TopicNameInvalid, "malformed response topic")
                })?;
                self.response_topic = Some(topic);
            }
            property_id::CORRELATION_DATA => {
                codec::binary_only_once(&mut self.correlation_data, "correlation data", buf)?;
            }
            property_id::TOPIC_ALIAS => {
                codec::non_zero_u16_only_once(&mut self.topic_alias, "topic alias", buf)?;
            }
            property_id::SUBSCRIPTION_IDENTIFIER => {
                codec::repeatable_variable_int(&mut self.subscription_identifiers, "subscription identifier", buf)?;
            }
            // User properties on PUBLISH belong to the application message and
            // are not problem information.
            property_id::USER_PROPERTY => {
                codec::user_property(&mut self.user_properties, buf)?;
            }
            _ => return Err(DecodeError::wrong_property(id)),
        }
        Ok(())
    }
}

fn alias_invalid(message: &str) -> DecodeError {
    DecodeError::new(DisconnectReasonCode::TopicAliasInvalid, message)
}

/// Resolve the topic name against the alias table.
fn resolve_topic(
    topic: Option<MqttString>,
    alias: Option<u16>,
    ctx: &DecodeContext,
) -> DecodeResult<(MqttString, Option<TopicAlias>)> {
    let Some(alias) = alias else {
        let topic =
            topic.ok_or_else(|| alias_invalid("topic alias must be present if topic name is zero length"))?;
        return Ok((topic, None));
    };

    if !ctx.topic_aliases.is_valid(alias) {
        return Err(alias_invalid("topic alias must not exceed topic alias maximum"));
    }

    match topic {
        Some(topic) => Ok((topic, Some(TopicAlias { alias, new_mapping: true }))),
        None => {
            let topic = ctx
                .topic_aliases
                .get(alias)
                .cloned()
                .ok_or_else(|| alias_invalid("topic alias has no mapping"))?;
            Ok((topic, Some(TopicAlias { alias, new_mapping: false })))
        }
    }
}

pub(crate) fn decode(header: &FixedHeader, mut body: Bytes, ctx: &DecodeContext) -> DecodeResult<Packet> {
    let (dup, qos, retain) = publish_flags(header.flags)?;

    if body.len() < MIN_REMAINING_LENGTH {
        return Err(DecodeError::too_short());
    }

    let topic = read_topic_name(&mut body, "topic")?;
    let packet_id = publish_packet_id(qos, &mut body)?;

    let mut props = Properties::default();
    decode_properties(&mut body, |id, buf| props.decode(id, buf))?;

    let (topic, topic_alias) = resolve_topic(topic, props.topic_alias, ctx)?;

    let payload_format = props.payload_format.and_then(PayloadFormat::from_u8);
    let payload = body;
    if ctx.validate_payload_format
        && payload_format == Some(PayloadFormat::Utf8)
        && std::str::from_utf8(&payload).is_err()
    {
        return Err(DecodeError::new(
            DisconnectReasonCode::PayloadFormatInvalid,
            "payload is not valid UTF-8",
        ));
    }

    Ok(Packet::Publish(Publish {
        message: PublishMessage {
            topic,
            payload,
            qos,
            retain,
            message_expiry_interval: props.message_expiry_interval,
            payload_format,
            content_type: props.content_type,
            response_topic: props.response_topic,
            correlation_data: props.correlation_data,
            user_properties: props.user_properties,
        },
        packet_id,
        dup,
        topic_alias,
        subscription_identifiers: props.subscription_identifiers,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{decode_with as run_with, prefixed, prefixed_property, user_property, with_properties};
    use crate::topic::TopicAliasTable;
    use crate::types::QoS;

    fn ctx_with_aliases(maximum: u16) -> DecodeContext {
        DecodeContext {
            topic_aliases: TopicAliasTable::new(maximum),
            ..Default::default()
        }
    }

    fn publish(first_byte: u8, body: &[u8], ctx: &DecodeContext) -> DecodeResult<Publish> {
        run_with(decode, first_byte, body, ctx).map(|packet| match packet {
            Packet::Publish(publish) => publish,
            other => panic!("Expected Publish, got {:?}", other),
        })
    }

    fn head(topic: &str, packet_id: Option<u16>) -> Vec<u8> {
        let mut out = prefixed(topic.as_bytes());
        if let Some(id) = packet_id {
            out.extend_from_slice(&id.to_be_bytes());
        }
        out
    }

    #[test]
    fn test_all_properties() {
        let mut props = vec![0x02, 0x00, 0x00, 0x00, 0x3C, 0x01, 0x01];
        props.extend(prefixed_property(0x03, b"text/plain"));
        props.extend(prefixed_property(0x08, b"reply/to"));
        props.extend(prefixed_property(0x09, &[1, 2, 3]));
        props.extend(user_property("k", "v1"));
        props.extend([0x0B, 0x05, 0x0B, 0x80, 0x01]);
        props.extend(user_property("k", "v2"));

        let body = with_properties(&head("room/1", Some(9)), &props, b"hi");
        let publish = publish(0x3D, &body, &DecodeContext::default()).unwrap();

        assert!(publish.dup);
        assert_eq!(publish.packet_id, Some(9));
        assert_eq!(publish.subscription_identifiers, vec![5, 128]);
        assert_eq!(publish.topic_alias, None);

        let message = publish.into_message();
        assert_eq!(message.topic, "room/1");
        assert_eq!(message.qos, QoS::ExactlyOnce);
        assert!(message.retain);
        assert_eq!(message.message_expiry_interval, Some(60));
        assert_eq!(message.payload_format, Some(PayloadFormat::Utf8));
        assert_eq!(message.content_type.unwrap(), "text/plain");
        assert_eq!(message.response_topic.unwrap(), "reply/to");
        assert_eq!(&message.correlation_data.unwrap()[..], &[1, 2, 3]);
        assert_eq!(message.user_properties.len(), 2);
        assert_eq!(message.user_properties[1].value, "v2");
        assert_eq!(&message.payload[..], b"hi");
    }

    #[test]
    fn test_qos0_has_no_packet_id() {
        let body = with_properties(&head("t", None), &[], &[0xAB]);
        let publish = publish(0x30, &body, &DecodeContext::default()).unwrap();
        assert_eq!(publish.packet_id, None);
        assert_eq!(&publish.message.payload[..], &[0xAB]);
    }

    #[test]
    fn test_empty_payload() {
        let body = with_properties(&head("t", Some(1)), &[], &[]);
        let publish = publish(0x32, &body, &DecodeContext::default()).unwrap();
        assert!(publish.message.payload.is_empty());
    }

    #[test]
    fn test_topic_alias_new_mapping() {
        let ctx = ctx_with_aliases(3);
        let body = with_properties(&head("a/b", None), &[0x23, 0x00, 0x03], &[]);
        let publish = publish(0x30, &body, &ctx).unwrap();
        assert_eq!(publish.topic_alias, Some(TopicAlias { alias: 3, new_mapping: true }));
        assert_eq!(publish.message.topic, "a/b");
    }

    #[test]
    fn test_topic_alias_lookup() {
        let mut ctx = ctx_with_aliases(3);
        ctx.topic_aliases.set(2, MqttString::new("mapped").unwrap());

        let body = with_properties(&head("", None), &[0x23, 0x00, 0x02], &[]);
        let publish = publish(0x30, &body, &ctx).unwrap();
        assert_eq!(publish.message.topic, "mapped");
        assert_eq!(publish.topic_alias, Some(TopicAlias { alias: 2, new_mapping: false }));
    }

    #[test]
    fn test_topic_alias_errors() {
        let ctx = ctx_with_aliases(3);

        let unmapped = with_properties(&head("", None), &[0x23, 0x00, 0x01], &[]);
        let err = publish(0x30, &unmapped, &ctx).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::TopicAliasInvalid);

        let too_large = with_properties(&head("t", None), &[0x23, 0x00, 0x04], &[]);
        let err = publish(0x30, &too_large, &ctx).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::TopicAliasInvalid);

        let zero = with_properties(&head("t", None), &[0x23, 0x00, 0x00], &[]);
        let err = publish(0x30, &zero, &ctx).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::ProtocolError);

        let no_alias = with_properties(&head("", None), &[], &[]);
        let err = publish(0x30, &no_alias, &ctx).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::TopicAliasInvalid);
        assert_eq!(err.message, "topic alias must be present if topic name is zero length");
    }

    #[test]
    fn test_wildcard_topics() {
        for topic in ["a/#", "+/b", "a+b"] {
            let body = with_properties(&head(topic, None), &[], &[]);
            let err = publish(0x30, &body, &DecodeContext::default()).unwrap_err();
            assert_eq!(err.reason_code, DisconnectReasonCode::TopicNameInvalid);
        }

        let props = prefixed_property(0x08, b"reply/#");
        let body = with_properties(&head("t", None), &props, &[]);
        let err = publish(0x30, &body, &DecodeContext::default()).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::TopicNameInvalid);
    }

    #[test]
    fn test_invalid_flags() {
        let body = with_properties(&head("t", Some(1)), &[], &[]);
        let err = publish(0x36, &body, &DecodeContext::default()).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::MalformedPacket);

        let body = with_properties(&head("t", None), &[], &[]);
        let err = publish(0x38, &body, &DecodeContext::default()).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::ProtocolError);
    }

    #[test]
    fn test_subscription_identifier_zero() {
        let body = with_properties(&head("t", None), &[0x0B, 0x00], &[]);
        let err = publish(0x30, &body, &DecodeContext::default()).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::ProtocolError);
    }

    #[test]
    fn test_payload_format() {
        let body = with_properties(&head("t", None), &[0x01, 0x02], &[]);
        let err = publish(0x30, &body, &DecodeContext::default()).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::MalformedPacket);

        let body = with_properties(&head("t", None), &[0x01, 0x01], &[0xFF, 0xFE]);
        assert!(publish(0x30, &body, &DecodeContext::default()).is_ok());

        let ctx = DecodeContext {
            validate_payload_format: true,
            ..Default::default()
        };
        let err = publish(0x30, &body, &ctx).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::PayloadFormatInvalid);
    }

    #[test]
    fn test_duplicate_properties() {
        for prop in [
            vec![0x02, 0, 0, 0, 1],
            vec![0x01, 0],
            prefixed_property(0x03, b"x"),
            prefixed_property(0x08, b"x"),
            prefixed_property(0x09, b"x"),
            vec![0x23, 0, 1],
        ] {
            let mut props = prop.clone();
            props.extend(prop);
            let body = with_properties(&head("t", None), &props, &[]);
            let err = publish(0x30, &body, &ctx_with_aliases(3)).unwrap_err();
            assert_eq!(err.reason_code, DisconnectReasonCode::ProtocolError, "{:?}", err);
        }
    }

    #[test]
    fn test_too_short() {
        let err = publish(0x30, &[0x00, 0x01], &DecodeContext::default()).unwrap_err();
        assert_eq!(err.message, "remaining length too short");

        // Properties length points past the end of the packet.
        let err = publish(0x30, &[0x00, 0x01, b't', 0x03, 0x01], &DecodeContext::default()).unwrap_err();
        assert_eq!(err.message, "remaining length too short");
    }
}
