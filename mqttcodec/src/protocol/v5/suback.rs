//! SUBACK and UNSUBACK decoders.

use bytes::Bytes;

use super::super::ack_packet_id;
use super::super::property::ReasonProperties;
use super::reason_properties;
use crate::dispatch::DecodeContext;
use crate::error::{DecodeError, DecodeResult};
use crate::packet::{Packet, SubAck, UnsubAck};
use crate::reason::{SubAckReasonCode, UnsubAckReasonCode};
use crate::types::FixedHeader;

/// Packet identifier, properties, then one reason code per topic filter.
fn decode_reason_codes<R>(
    mut body: Bytes,
    ctx: &DecodeContext,
    parse: fn(u8) -> Option<R>,
) -> DecodeResult<(u16, Vec<R>, ReasonProperties)> {
    let packet_id = ack_packet_id(&mut body)?;
    let props = reason_properties(&mut body, ctx.restrictions.request_problem_information)?;

    if body.is_empty() {
        return Err(DecodeError::protocol("must contain at least one reason code"));
    }
    let reason_codes = body
        .iter()
        .map(|&code| parse(code).ok_or_else(|| DecodeError::wrong_reason_code(code)))
        .collect::<DecodeResult<Vec<_>>>()?;

    Ok((packet_id, reason_codes, props))
}

pub(crate) fn decode_suback(_: &FixedHeader, body: Bytes, ctx: &DecodeContext) -> DecodeResult<Packet> {
    let (packet_id, reason_codes, props) = decode_reason_codes(body, ctx, SubAckReasonCode::from_u8)?;
    Ok(Packet::SubAck(SubAck {
        packet_id,
        reason_codes,
        reason_string: props.reason_string,
        user_properties: props.user_properties,
    }))
}

pub(crate) fn decode_unsuback(_: &FixedHeader, body: Bytes, ctx: &DecodeContext) -> DecodeResult<Packet> {
    let (packet_id, reason_codes, props) = decode_reason_codes(body, ctx, UnsubAckReasonCode::from_u8)?;
    Ok(Packet::UnsubAck(UnsubAck {
        packet_id,
        reason_codes,
        reason_string: props.reason_string,
        user_properties: props.user_properties,
    }))
}
