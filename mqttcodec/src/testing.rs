//! Wire builders shared by the unit tests.

use bytes::Bytes;

use crate::dispatch::{DecodeContext, DecodeFn};
use crate::error::DecodeResult;
use crate::packet::Packet;
use crate::types::FixedHeader;

pub fn varint(mut value: usize) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let mut byte = (value % 128) as u8;
        value /= 128;
        if value > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            return out;
        }
    }
}

/// Length-prefixed string or binary field.
pub fn prefixed(data: &[u8]) -> Vec<u8> {
    let mut out = (data.len() as u16).to_be_bytes().to_vec();
    out.extend_from_slice(data);
    out
}

/// Property with a length-prefixed value.
pub fn prefixed_property(id: u8, data: &[u8]) -> Vec<u8> {
    let mut out = vec![id];
    out.extend(prefixed(data));
    out
}

pub fn user_property(name: &str, value: &str) -> Vec<u8> {
    let mut out = vec![0x26];
    out.extend(prefixed(name.as_bytes()));
    out.extend(prefixed(value.as_bytes()));
    out
}

/// `head`, the properties length, `properties`, then `tail`.
pub fn with_properties(head: &[u8], properties: &[u8], tail: &[u8]) -> Vec<u8> {
    let mut out = head.to_vec();
    out.extend(varint(properties.len()));
    out.extend_from_slice(properties);
    out.extend_from_slice(tail);
    out
}

/// Complete packet: first byte, remaining length, body.
pub fn packet(first_byte: u8, body: &[u8]) -> Vec<u8> {
    let mut out = vec![first_byte];
    out.extend(varint(body.len()));
    out.extend_from_slice(body);
    out
}

/// Run one decoder directly on a body.
pub fn decode_with(decode_fn: DecodeFn, first_byte: u8, body: &[u8], ctx: &DecodeContext) -> DecodeResult<Packet> {
    let header = FixedHeader {
        type_code: first_byte >> 4,
        flags: first_byte & 0x0F,
        remaining_length: body.len() as u32,
        header_length: 1 + varint(body.len()).len(),
    };
    decode_fn(&header, Bytes::copy_from_slice(body), ctx)
}

pub fn decode(decode_fn: DecodeFn, first_byte: u8, body: &[u8]) -> DecodeResult<Packet> {
    decode_with(decode_fn, first_byte, body, &DecodeContext::default())
}
