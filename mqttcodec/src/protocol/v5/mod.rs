//! MQTT 5.0 (v5) packet decoders, one module per packet family.

pub mod ack;
pub mod auth;
pub mod connack;
pub mod disconnect;
pub mod publish;
pub mod suback;

use bytes::Bytes;

use super::property::{decode_properties, ReasonProperties};
use crate::error::{DecodeError, DecodeResult};

/// Property block that may only hold a reason string and user properties.
pub(crate) fn reason_properties(body: &mut Bytes, problem_information: bool) -> DecodeResult<ReasonProperties> {
    let mut props = ReasonProperties::default();
    decode_properties(body, |id, buf| {
        if props.decode(id, buf, problem_information)? {
            Ok(())
        } else {
            Err(DecodeError::wrong_property(id))
        }
    })?;
    Ok(props)
}
