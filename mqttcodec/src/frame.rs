//! Frame assembly.
//!
//! Finds packet boundaries in the accumulated input. A frame is only split
//! off once every byte of it is buffered; until then the input is left
//! untouched so the same bytes can be looked at again when more arrive.

use bytes::{Bytes, BytesMut};

use crate::error::{DecodeError, DecodeResult};
use crate::protocol::codec;
use crate::types::FixedHeader;

/// One complete packet: its fixed header and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FixedHeader,
    pub body: Bytes,
}

/// Parse a fixed header from buffer.
///
/// `Ok(None)` means more bytes are needed to know the remaining length.
pub fn read_fixed_header(buf: &[u8]) -> DecodeResult<Option<FixedHeader>> {
    // At least the type byte and one length byte.
    if buf.len() < 2 {
        return Ok(None);
    }

    let first_byte = buf[0];
    match codec::read_variable_int(&buf[1..]) {
        Ok(Some((remaining_length, var_len))) => Ok(Some(FixedHeader {
            type_code: first_byte >> 4,
            flags: first_byte & 0x0F,
            remaining_length,
            header_length: 1 + var_len,
        })),
        Ok(None) => Ok(None),
        Err(e) => Err(DecodeError::malformed(format!("malformed remaining length: {e}"))),
    }
}

/// Split the frame described by `header` off the front of `src`.
///
/// Returns `None`, consuming nothing, while the body is incomplete.
pub fn split_frame(src: &mut BytesMut, header: FixedHeader) -> Option<Frame> {
    if src.len() < header.frame_length() {
        return None;
    }
    let mut frame = src.split_to(header.frame_length()).freeze();
    let body = frame.split_off(header.header_length);
    Some(Frame { header, body })
}
