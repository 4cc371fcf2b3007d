//! MQTT packet decoding.
//!
//! This module provides packet decoders for both
//! MQTT 3.1.1 (v4) and MQTT 5.0 (v5), plus the primitives they share.

pub mod codec;
pub mod property;
pub mod v4;
pub mod v5;

use bytes::Bytes;

use crate::error::{DecodeError, DecodeResult};
use crate::types::QoS;

/// DUP, QoS and RETAIN from the PUBLISH flags nibble.
pub(crate) fn publish_flags(flags: u8) -> DecodeResult<(bool, QoS, bool)> {
    let dup = flags & 0b1000 != 0;
    let retain = flags & 0b0001 != 0;
    let qos = QoS::from_u8((flags >> 1) & 0b11)
        .ok_or_else(|| DecodeError::malformed("wrong QoS: 3"))?;
    if dup && qos == QoS::AtMostOnce {
        return Err(DecodeError::protocol("DUP flag must be 0 if QoS is 0"));
    }
    Ok((dup, qos, retain))
}

/// Packet identifier of a QoS 1/2 PUBLISH.
pub(crate) fn publish_packet_id(qos: QoS, body: &mut Bytes) -> DecodeResult<Option<u16>> {
    if qos == QoS::AtMostOnce {
        return Ok(None);
    }
    codec::read_u16(body, "packet identifier").map(Some)
}

/// Packet identifier that starts every acknowledgement.
pub(crate) fn ack_packet_id(body: &mut Bytes) -> DecodeResult<u16> {
    if body.len() < 2 {
        return Err(DecodeError::too_short());
    }
    codec::read_u16(body, "packet identifier")
}

pub(crate) fn ensure_consumed(body: &Bytes) -> DecodeResult<()> {
    if !body.is_empty() {
        return Err(DecodeError::too_long());
    }
    Ok(())
}
