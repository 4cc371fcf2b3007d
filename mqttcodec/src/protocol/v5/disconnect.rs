//! DISCONNECT decoder.

use bytes::{Buf, Bytes};

use super::super::codec;
use super::super::ensure_consumed;
use super::super::property::{decode_properties, property_id, ReasonProperties};
use crate::dispatch::DecodeContext;
use crate::error::{DecodeError, DecodeResult};
use crate::packet::{Disconnect, Packet};
use crate::reason::DisconnectReasonCode;
use crate::types::{FixedHeader, MqttString};

#[derive(Default)]
struct Properties {
    session_expiry_interval: Option<u32>,
    server_reference: Option<MqttString>,
    reason: ReasonProperties,
}

impl Properties {
    fn decode(&mut self, id: u32, buf: &mut Bytes) -> DecodeResult<()> {
        match id {
            property_id::SESSION_EXPIRY_INTERVAL => {
                codec::u32_only_once(&mut self.session_expiry_interval, "session expiry interval", buf)?;
            }
            property_id::SERVER_REFERENCE => {
                codec::utf8_only_once(&mut self.server_reference, "server reference", buf)?;
            }
            // A server explains why it closes the connection regardless of
            // what the client requested.
            _ if self.reason.decode(id, buf, true)? => {}
            _ => return Err(DecodeError::wrong_property(id)),
        }
        Ok(())
    }
}

pub(crate) fn decode(_: &FixedHeader, mut body: Bytes, _: &DecodeContext) -> DecodeResult<Packet> {
    if body.is_empty() {
        return Ok(Packet::Disconnect(Disconnect::new(DisconnectReasonCode::NormalDisconnection)));
    }

    let code = body.get_u8();
    let reason_code = DisconnectReasonCode::from_u8(code).ok_or_else(|| DecodeError::wrong_reason_code(code))?;

    let mut props = Properties::default();
    if body.has_remaining() {
        decode_properties(&mut body, |id, buf| props.decode(id, buf))?;
        ensure_consumed(&body)?;
    }

    Ok(Packet::Disconnect(Disconnect {
        reason_code,
        session_expiry_interval: props.session_expiry_interval,
        server_reference: props.server_reference,
        reason_string: props.reason.reason_string,
        user_properties: props.reason.user_properties,
    }))
}
