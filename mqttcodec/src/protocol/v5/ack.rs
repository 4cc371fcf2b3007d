//! PUBACK, PUBREC, PUBREL and PUBCOMP decoders.
//!
//! All four share one layout: packet identifier, then an optional reason code
//! and an optional property block. A remaining length of 2 means SUCCESS
//! with no properties.

use bytes::{Buf, Bytes};

use super::super::{ack_packet_id, ensure_consumed};
use super::reason_properties;
use crate::dispatch::DecodeContext;
use crate::error::{DecodeError, DecodeResult};
use crate::packet::{Packet, PublishAck};
use crate::reason::{PubAckReasonCode, PubRelReasonCode};
use crate::types::FixedHeader;

fn decode_ack<R>(
    mut body: Bytes,
    ctx: &DecodeContext,
    parse: fn(u8) -> Option<R>,
    success: R,
) -> DecodeResult<PublishAck<R>> {
    let packet_id = ack_packet_id(&mut body)?;
    if body.is_empty() {
        return Ok(PublishAck::new(packet_id, success));
    }

    let code = body.get_u8();
    let reason_code = parse(code).ok_or_else(|| DecodeError::wrong_reason_code(code))?;

    let mut ack = PublishAck::new(packet_id, reason_code);
    if body.has_remaining() {
        let props = reason_properties(&mut body, ctx.restrictions.request_problem_information)?;
        ensure_consumed(&body)?;
        ack.reason_string = props.reason_string;
        ack.user_properties = props.user_properties;
    }
    Ok(ack)
}

pub(crate) fn decode_puback(_: &FixedHeader, body: Bytes, ctx: &DecodeContext) -> DecodeResult<Packet> {
    decode_ack(body, ctx, PubAckReasonCode::from_u8, PubAckReasonCode::Success).map(Packet::PubAck)
}

pub(crate) fn decode_pubrec(_: &FixedHeader, body: Bytes, ctx: &DecodeContext) -> DecodeResult<Packet> {
    decode_ack(body, ctx, PubAckReasonCode::from_u8, PubAckReasonCode::Success).map(Packet::PubRec)
}

pub(crate) fn decode_pubrel(_: &FixedHeader, body: Bytes, ctx: &DecodeContext) -> DecodeResult<Packet> {
    decode_ack(body, ctx, PubRelReasonCode::from_u8, PubRelReasonCode::Success).map(Packet::PubRel)
}

pub(crate) fn decode_pubcomp(_: &FixedHeader, body: Bytes, ctx: &DecodeContext) -> DecodeResult<Packet> {
    decode_ack(body, ctx, PubRelReasonCode::from_u8, PubRelReasonCode::Success).map(Packet::PubComp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reason::DisconnectReasonCode;
    use crate::restrictions::ConnectRestrictions;
    use crate::testing::{decode as run, decode_with as run_with, prefixed_property, user_property, with_properties};

    #[test]
    fn test_short_form_is_success() {
        match run(decode_puback, 0x40, &[0x00, 0x07]).unwrap() {
            Packet::PubAck(ack) => {
                assert_eq!(ack.packet_id, 7);
                assert_eq!(ack.reason_code, PubAckReasonCode::Success);
                assert!(ack.reason_string.is_none());
            }
            other => panic!("Expected PubAck, got {:?}", other),
        }
        match run(decode_pubcomp, 0x70, &[0x01, 0x00]).unwrap() {
            Packet::PubComp(ack) => assert_eq!(ack.packet_id, 256),
            other => panic!("Expected PubComp, got {:?}", other),
        }
    }

    #[test]
    fn test_reason_code_without_properties() {
        match run(decode_pubrec, 0x50, &[0x00, 0x01, 0x10]).unwrap() {
            Packet::PubRec(ack) => assert_eq!(ack.reason_code, PubAckReasonCode::NoMatchingSubscribers),
            other => panic!("Expected PubRec, got {:?}", other),
        }
        match run(decode_pubrel, 0x62, &[0x00, 0x01, 0x92]).unwrap() {
            Packet::PubRel(ack) => assert_eq!(ack.reason_code, PubRelReasonCode::PacketIdentifierNotFound),
            other => panic!("Expected PubRel, got {:?}", other),
        }
    }

    #[test]
    fn test_properties() {
        let mut props = prefixed_property(0x1F, b"quota");
        props.extend(user_property("a", "b"));
        let body = with_properties(&[0x00, 0x05, 0x97], &props, &[]);

        match run(decode_puback, 0x40, &body).unwrap() {
            Packet::PubAck(ack) => {
                assert_eq!(ack.reason_code, PubAckReasonCode::QuotaExceeded);
                assert_eq!(ack.reason_string.unwrap(), "quota");
                assert_eq!(ack.user_properties.len(), 1);
            }
            other => panic!("Expected PubAck, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_reason_code() {
        // PUBREL only knows SUCCESS and PACKET_IDENTIFIER_NOT_FOUND.
        let err = run(decode_pubrel, 0x62, &[0x00, 0x01, 0x10]).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::MalformedPacket);
        assert_eq!(err.message, "wrong reason code: 0x10");

        let err = run(decode_puback, 0x40, &[0x00, 0x01, 0x01]).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::MalformedPacket);
    }

    #[test]
    fn test_length_errors() {
        let err = run(decode_puback, 0x40, &[0x00]).unwrap_err();
        assert_eq!(err.message, "remaining length too short");

        let err = run(decode_puback, 0x40, &[0x00, 0x01, 0x00, 0x00, 0xFF]).unwrap_err();
        assert_eq!(err.message, "remaining length too long");

        let err = run(decode_puback, 0x40, &[0x00, 0x01, 0x00, 0x05, 0x1F]).unwrap_err();
        assert_eq!(err.message, "remaining length too short");
    }

    #[test]
    fn test_unexpected_property() {
        let body = with_properties(&[0x00, 0x01, 0x00], &[0x02, 0, 0, 0, 1], &[]);
        let err = run(decode_puback, 0x40, &body).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::MalformedPacket);
        assert_eq!(err.message, "wrong property with identifier 2");
    }

    #[test]
    fn test_problem_information_not_requested() {
        let ctx = DecodeContext {
            restrictions: ConnectRestrictions {
                request_problem_information: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let body = with_properties(&[0x00, 0x01, 0x00], &prefixed_property(0x1F, b"why"), &[]);
        let err = run_with(decode_puback, 0x40, &body, &ctx).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::ProtocolError);

        let body = with_properties(&[0x00, 0x01, 0x00], &user_property("k", "v"), &[]);
        let err = run_with(decode_pubcomp, 0x70, &body, &ctx).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::ProtocolError);
    }

    #[test]
    fn test_duplicate_reason_string() {
        let mut props = prefixed_property(0x1F, b"a");
        props.extend(prefixed_property(0x1F, b"b"));
        let body = with_properties(&[0x00, 0x01, 0x00], &props, &[]);
        let err = run(decode_pubrec, 0x50, &body).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::ProtocolError);
        assert_eq!(err.message, "reason string must not be included more than once");
    }
}
