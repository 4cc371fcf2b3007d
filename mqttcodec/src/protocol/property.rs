//! MQTT 5.0 property block parsing.
//!
//! A property block is a variable byte integer length followed by a run of
//! `identifier, value` pairs that must fill that length exactly. Decoders
//! supply a handler that maps each identifier to one of the primitives in
//! [`codec`](super::codec); identifiers the handler does not know are
//! malformed.

use bytes::{Buf, Bytes};

use super::codec;
use crate::error::{DecodeError, DecodeResult};
use crate::types::{MqttString, UserProperty};

/// MQTT 5.0 property identifiers.
pub mod property_id {
    pub const PAYLOAD_FORMAT_INDICATOR: u32 = 0x01;
    pub const MESSAGE_EXPIRY_INTERVAL: u32 = 0x02;
    pub const CONTENT_TYPE: u32 = 0x03;
    pub const RESPONSE_TOPIC: u32 = 0x08;
    pub const CORRELATION_DATA: u32 = 0x09;
    pub const SUBSCRIPTION_IDENTIFIER: u32 = 0x0B;
    pub const SESSION_EXPIRY_INTERVAL: u32 = 0x11;
    pub const ASSIGNED_CLIENT_IDENTIFIER: u32 = 0x12;
    pub const SERVER_KEEP_ALIVE: u32 = 0x13;
    pub const AUTHENTICATION_METHOD: u32 = 0x15;
    pub const AUTHENTICATION_DATA: u32 = 0x16;
    pub const REQUEST_PROBLEM_INFORMATION: u32 = 0x17;
    pub const WILL_DELAY_INTERVAL: u32 = 0x18;
    pub const REQUEST_RESPONSE_INFORMATION: u32 = 0x19;
    pub const RESPONSE_INFORMATION: u32 = 0x1A;
    pub const SERVER_REFERENCE: u32 = 0x1C;
    pub const REASON_STRING: u32 = 0x1F;
    pub const RECEIVE_MAXIMUM: u32 = 0x21;
    pub const TOPIC_ALIAS_MAXIMUM: u32 = 0x22;
    pub const TOPIC_ALIAS: u32 = 0x23;
    pub const MAXIMUM_QOS: u32 = 0x24;
    pub const RETAIN_AVAILABLE: u32 = 0x25;
    pub const USER_PROPERTY: u32 = 0x26;
    pub const MAXIMUM_PACKET_SIZE: u32 = 0x27;
    pub const WILDCARD_SUBSCRIPTION_AVAILABLE: u32 = 0x28;
    pub const SUBSCRIPTION_IDENTIFIERS_AVAILABLE: u32 = 0x29;
    pub const SHARED_SUBSCRIPTION_AVAILABLE: u32 = 0x2A;
}

/// Read a property block from `body`.
///
/// `handle` is called once per property with the identifier and a buffer
/// positioned at the value. It must consume exactly the value bytes; reads
/// past the end of the block fail as too short.
pub fn decode_properties<F>(body: &mut Bytes, mut handle: F) -> DecodeResult<()>
where
    F: FnMut(u32, &mut Bytes) -> DecodeResult<()>,
{
    let length = codec::variable_int(body, "properties length")? as usize;
    if body.remaining() < length {
        return Err(DecodeError::too_short());
    }

    let mut block = body.split_to(length);
    while block.has_remaining() {
        let id = codec::variable_int(&mut block, "property identifier")?;
        handle(id, &mut block)?;
    }
    Ok(())
}

/// Reason string and user properties, the tail shared by most MQTT 5.0
/// packets.
#[derive(Debug, Default)]
pub(crate) struct ReasonProperties {
    pub reason_string: Option<MqttString>,
    pub user_properties: Vec<UserProperty>,
}

impl ReasonProperties {
    /// Try to consume `id`. Returns `Ok(false)` if it is not one of ours.
    ///
    /// With `problem_information` false the client asked the server not to
    /// send diagnostics, so both properties are a protocol error.
    pub fn decode(&mut self, id: u32, buf: &mut Bytes, problem_information: bool) -> DecodeResult<bool> {
        match id {
            property_id::REASON_STRING => {
                if !problem_information {
                    return Err(DecodeError::protocol(
                        "reason string must not be included if problem information was not requested",
                    ));
                }
                codec::utf8_only_once(&mut self.reason_string, "reason string", buf)?;
            }
            property_id::USER_PROPERTY => {
                if !problem_information {
                    return Err(DecodeError::protocol(
                        "user property must not be included if problem information was not requested",
                    ));
                }
                codec::user_property(&mut self.user_properties, buf)?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reason::DisconnectReasonCode;

    fn reason_only(body: &'static [u8], problem_information: bool) -> DecodeResult<ReasonProperties> {
        let mut body = Bytes::from_static(body);
        let mut props = ReasonProperties::default();
        decode_properties(&mut body, |id, buf| {
            if props.decode(id, buf, problem_information)? {
                Ok(())
            } else {
                Err(DecodeError::wrong_property(id))
            }
        })?;
        assert!(body.is_empty());
        Ok(props)
    }

    #[test]
    fn test_empty_block() {
        let props = reason_only(&[0x00], true).unwrap();
        assert!(props.reason_string.is_none());
        assert!(props.user_properties.is_empty());
    }

    #[test]
    fn test_reason_string_and_user_properties() {
        let props = reason_only(b"\x0D\x1F\x00\x02ok\x26\x00\x01a\x00\x02bc", true).unwrap();
        assert_eq!(props.reason_string.unwrap(), "ok");
        assert_eq!(props.user_properties.len(), 1);
        assert_eq!(props.user_properties[0].name, "a");
        assert_eq!(props.user_properties[0].value, "bc");
    }

    #[test]
    fn test_unknown_identifier() {
        let err = reason_only(&[0x02, 0x01, 0x00], true).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::MalformedPacket);
        assert_eq!(err.message, "wrong property with identifier 1");
    }

    #[test]
    fn test_identifier_is_a_variable_int() {
        // 0x9F 0x00 is a non-minimal encoding of 0x1F.
        let err = reason_only(&[0x03, 0x9F, 0x00, 0x00], true).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::MalformedPacket);
        assert!(err.message.contains("not minimum bytes"));
    }

    #[test]
    fn test_value_overruns_block() {
        // Block claims 4 bytes but the reason string needs 5.
        let err = reason_only(b"\x04\x1F\x00\x02o", true).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::MalformedPacket);
        assert!(err.message.contains("too short"));
    }

    #[test]
    fn test_block_longer_than_body() {
        let err = reason_only(&[0x05, 0x1F, 0x00, 0x00], true).unwrap_err();
        assert_eq!(err.message, "remaining length too short");
    }

    #[test]
    fn test_problem_information_not_requested() {
        let err = reason_only(b"\x05\x1F\x00\x02ok", false).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::ProtocolError);
    }

    #[test]
    fn test_duplicate_reason_string() {
        let err = reason_only(b"\x0A\x1F\x00\x02ok\x1F\x00\x02no", true).unwrap_err();
        assert_eq!(err.reason_code, DisconnectReasonCode::ProtocolError);
    }
}
