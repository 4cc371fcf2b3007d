//! AUTH decoder (enhanced authentication exchange).

use bytes::{Buf, Bytes};

use super::super::codec;
use super::super::ensure_consumed;
use super::super::property::{decode_properties, property_id, ReasonProperties};
use crate::dispatch::DecodeContext;
use crate::error::{DecodeError, DecodeResult};
use crate::packet::{Auth, Packet};
use crate::reason::AuthReasonCode;
use crate::types::{FixedHeader, MqttString};

/// Reason code and properties length. The method is mandatory, so the short
/// forms allowed for other packets do not apply.
const MIN_REMAINING_LENGTH: usize = 2;

#[derive(Default)]
struct Properties {
    method: Option<MqttString>,
    data: Option<Bytes>,
    reason: ReasonProperties,
}

impl Properties {
    fn decode(&mut self, id: u32, buf: &mut Bytes, problem_information: bool) -> DecodeResult<()> {
        match id {
            property_id::AUTHENTICATION_METHOD => {
                codec::utf8_only_once(&mut self.method, "auth method", buf)?;
            }
            property_id::AUTHENTICATION_DATA => {
                codec::binary_only_once(&mut self.data, "auth data", buf)?;
            }
            _ if self.reason.decode(id, buf, problem_information)? => {}
            _ => return Err(DecodeError::wrong_property(id)),
        }
        Ok(())
    }
}

pub(crate) fn decode(_: &FixedHeader, mut body: Bytes, ctx: &DecodeContext) -> DecodeResult<Packet> {
    if body.len() < MIN_REMAINING_LENGTH {
        return Err(DecodeError::too_short());
    }

    let code = body.get_u8();
    let reason_code = AuthReasonCode::from_u8(code).ok_or_else(|| DecodeError::wrong_reason_code(code))?;

    let problem_information = ctx.restrictions.request_problem_information;
    let mut props = Properties::default();
    decode_properties(&mut body, |id, buf| props.decode(id, buf, problem_information))?;
    ensure_consumed(&body)?;

    let method = props
        .method
        .ok_or_else(|| DecodeError::protocol("auth method must be present"))?;

    Ok(Packet::Auth(Auth {
        reason_code,
        method,
        data: props.data,
        reason_string: props.reason.reason_string,
        user_properties: props.reason.user_properties,
    }))
}
