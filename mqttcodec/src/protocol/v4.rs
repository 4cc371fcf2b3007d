//! MQTT 3.1.1 (v4) packet decoders.
//!
//! No properties and no reason codes beyond the CONNACK return code and the
//! SUBACK return codes, which are mapped onto their MQTT 5.0 equivalents.

use bytes::{Buf, Bytes};

use super::{ack_packet_id, ensure_consumed, publish_flags, publish_packet_id};
use crate::dispatch::DecodeContext;
use crate::error::{DecodeError, DecodeResult};
use crate::packet::{ConnAck, Packet, Publish, PublishAck, PublishMessage, SubAck, UnsubAck};
use crate::reason::{ConnAckReasonCode, PubAckReasonCode, PubRelReasonCode, SubAckReasonCode};
use crate::topic::read_topic_name;
use crate::types::FixedHeader;

/// Map a CONNACK return code onto the MQTT 5.0 reason code.
pub fn connect_return_code(code: u8) -> Option<ConnAckReasonCode> {
    Some(match code {
        0 => ConnAckReasonCode::Success,
        1 => ConnAckReasonCode::UnsupportedProtocolVersion,
        2 => ConnAckReasonCode::ClientIdentifierNotValid,
        3 => ConnAckReasonCode::ServerUnavailable,
        4 => ConnAckReasonCode::BadUserNameOrPassword,
        5 => ConnAckReasonCode::NotAuthorized,
        _ => return None,
    })
}

fn suback_return_code(code: u8) -> Option<SubAckReasonCode> {
    Some(match code {
        0x00 => SubAckReasonCode::GrantedQos0,
        0x01 => SubAckReasonCode::GrantedQos1,
        0x02 => SubAckReasonCode::GrantedQos2,
        0x80 => SubAckReasonCode::UnspecifiedError,
        _ => return None,
    })
}

fn exact_length(body: &Bytes, len: usize) -> DecodeResult<()> {
    if body.len() < len {
        return Err(DecodeError::too_short());
    }
    if body.len() > len {
        return Err(DecodeError::too_long());
    }
    Ok(())
}

pub(crate) fn decode_connack(_: &FixedHeader, mut body: Bytes, _: &DecodeContext) -> DecodeResult<Packet> {
    exact_length(&body, 2)?;

    let flags = body.get_u8();
    if flags & 0xFE != 0 {
        return Err(DecodeError::malformed("wrong CONNACK flags"));
    }
    let session_present = flags & 0x01 != 0;

    let code = body.get_u8();
    let reason_code = connect_return_code(code).ok_or_else(|| DecodeError::wrong_reason_code(code))?;
    if session_present && reason_code != ConnAckReasonCode::Success {
        return Err(DecodeError::malformed("session present must be 0 if return code is not SUCCESS"));
    }

    Ok(Packet::ConnAck(ConnAck::new(reason_code, session_present)))
}

pub(crate) fn decode_publish(header: &FixedHeader, mut body: Bytes, _: &DecodeContext) -> DecodeResult<Packet> {
    let (dup, qos, retain) = publish_flags(header.flags)?;

    let topic = read_topic_name(&mut body, "topic")?
        .ok_or_else(|| DecodeError::protocol("topic name must not be empty"))?;
    let packet_id = publish_packet_id(qos, &mut body)?;

    Ok(Packet::Publish(Publish {
        message: PublishMessage::new(topic, body, qos, retain),
        packet_id,
        dup,
        topic_alias: None,
        subscription_identifiers: Vec::new(),
    }))
}

fn decode_ack<R>(body: &mut Bytes, success: R) -> DecodeResult<PublishAck<R>> {
    exact_length(body, 2)?;
    Ok(PublishAck::new(ack_packet_id(body)?, success))
}

pub(crate) fn decode_puback(_: &FixedHeader, mut body: Bytes, _: &DecodeContext) -> DecodeResult<Packet> {
    decode_ack(&mut body, PubAckReasonCode::Success).map(Packet::PubAck)
}

pub(crate) fn decode_pubrec(_: &FixedHeader, mut body: Bytes, _: &DecodeContext) -> DecodeResult<Packet> {
    decode_ack(&mut body, PubAckReasonCode::Success).map(Packet::PubRec)
}

pub(crate) fn decode_pubrel(_: &FixedHeader, mut body: Bytes, _: &DecodeContext) -> DecodeResult<Packet> {
    decode_ack(&mut body, PubRelReasonCode::Success).map(Packet::PubRel)
}

pub(crate) fn decode_pubcomp(_: &FixedHeader, mut body: Bytes, _: &DecodeContext) -> DecodeResult<Packet> {
    decode_ack(&mut body, PubRelReasonCode::Success).map(Packet::PubComp)
}

pub(crate) fn decode_suback(_: &FixedHeader, mut body: Bytes, _: &DecodeContext) -> DecodeResult<Packet> {
    let packet_id = ack_packet_id(&mut body)?;
    if body.is_empty() {
        return Err(DecodeError::protocol("must contain at least one return code"));
    }

    let reason_codes = body
        .iter()
        .map(|&code| suback_return_code(code).ok_or_else(|| DecodeError::wrong_reason_code(code)))
        .collect::<DecodeResult<Vec<_>>>()?;

    Ok(Packet::SubAck(SubAck {
        packet_id,
        reason_codes,
        reason_string: None,
        user_properties: Vec::new(),
    }))
}

pub(crate) fn decode_unsuback(_: &FixedHeader, mut body: Bytes, _: &DecodeContext) -> DecodeResult<Packet> {
    exact_length(&body, 2)?;
    Ok(Packet::UnsubAck(UnsubAck {
        packet_id: ack_packet_id(&mut body)?,
        reason_codes: Vec::new(),
        reason_string: None,
        user_properties: Vec::new(),
    }))
}

/// PINGRESP has the same empty body in both protocol versions.
pub(crate) fn decode_pingresp(_: &FixedHeader, body: Bytes, _: &DecodeContext) -> DecodeResult<Packet> {
    ensure_consumed(&body)?;
    Ok(Packet::PingResp)
}
