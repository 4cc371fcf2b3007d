//! MQTT packet decoding primitives.
//!
//! Low-level readers over a packet body held in [`Bytes`]. Every reader
//! bounds-checks before it consumes, so a short body always surfaces as a
//! MALFORMED_PACKET fault instead of a panic. The `*_only_once` family reads
//! single-occurrence properties into decode-scoped slots.

use std::fmt;

use bytes::{Buf, Bytes};

use crate::error::{DecodeError, DecodeResult};
use crate::types::{MqttString, UserProperty};

/// Largest value a variable byte integer can carry.
pub const VARIABLE_INT_MAX: u32 = 268_435_455;

/// Maximum encoded length of a variable byte integer.
pub const VARIABLE_INT_MAX_BYTES: usize = 4;

// ============================================================================
// Variable byte integer
// ============================================================================

/// Why a variable byte integer could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableIntError {
    /// The fourth byte still has the continuation bit set.
    TooLarge,
    /// A trailing zero byte made the encoding longer than necessary.
    NotMinimumBytes,
}

impl fmt::Display for VariableIntError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableIntError::TooLarge => f.write_str("too large"),
            VariableIntError::NotMinimumBytes => f.write_str("not minimum bytes"),
        }
    }
}

/// Read a variable-length integer (remaining length encoding).
///
/// Returns `Ok(Some((value, bytes_consumed)))`, or `Ok(None)` if the slice
/// ends before the last byte of the integer.
pub fn read_variable_int(buf: &[u8]) -> Result<Option<(u32, usize)>, VariableIntError> {
    let mut value = 0u32;

    for (i, &byte) in buf.iter().take(VARIABLE_INT_MAX_BYTES).enumerate() {
        value |= ((byte & 0x7F) as u32) << (7 * i);

        if byte & 0x80 == 0 {
            if i > 0 && byte == 0 {
                return Err(VariableIntError::NotMinimumBytes);
            }
            return Ok(Some((value, i + 1)));
        }

        if i == VARIABLE_INT_MAX_BYTES - 1 {
            return Err(VariableIntError::TooLarge);
        }
    }

    Ok(None)
}

/// Calculate the number of bytes needed for a variable-length integer.
pub const fn variable_int_len(value: u32) -> usize {
    if value < 128 {
        1
    } else if value < 128 * 128 {
        2
    } else if value < 128 * 128 * 128 {
        3
    } else {
        4
    }
}

/// Read a variable byte integer out of a packet body.
pub fn variable_int(buf: &mut Bytes, name: &str) -> DecodeResult<u32> {
    match read_variable_int(buf.chunk()) {
        Ok(Some((value, len))) => {
            buf.advance(len);
            Ok(value)
        }
        Ok(None) => Err(DecodeError::malformed(format!("malformed {name}: too short"))),
        Err(e) => Err(DecodeError::malformed(format!("malformed {name}: {e}"))),
    }
}

// ============================================================================
// Fixed width integers, strings and binary data
// ============================================================================

fn ensure(buf: &Bytes, len: usize, name: &str) -> DecodeResult<()> {
    if buf.remaining() < len {
        return Err(DecodeError::malformed(format!("malformed {name}: too short")));
    }
    Ok(())
}

/// Length prefix of a string or binary field, checked against the bytes left.
fn prefixed_len(buf: &Bytes, name: &str) -> DecodeResult<usize> {
    ensure(buf, 2, name)?;
    let len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
    ensure(buf, 2 + len, name)?;
    Ok(len)
}

pub fn read_u8(buf: &mut Bytes, name: &str) -> DecodeResult<u8> {
    ensure(buf, 1, name)?;
    Ok(buf.get_u8())
}

/// Read a 2-byte big-endian u16.
pub fn read_u16(buf: &mut Bytes, name: &str) -> DecodeResult<u16> {
    ensure(buf, 2, name)?;
    Ok(buf.get_u16())
}

/// Read a 4-byte big-endian u32.
pub fn read_u32(buf: &mut Bytes, name: &str) -> DecodeResult<u32> {
    ensure(buf, 4, name)?;
    Ok(buf.get_u32())
}

/// Read binary data (2-byte length prefix + data) without copying.
pub fn read_binary(buf: &mut Bytes, name: &str) -> DecodeResult<Bytes> {
    let len = prefixed_len(buf, name)?;
    buf.advance(2);
    Ok(buf.split_to(len))
}

/// Read a UTF-8 string (2-byte length prefix + data).
///
/// Invalid UTF-8 (including encoded surrogates) and U+0000 are malformed.
pub fn read_string(buf: &mut Bytes, name: &str) -> DecodeResult<MqttString> {
    let len = prefixed_len(buf, name)?;
    buf.advance(2);
    let raw = buf.split_to(len);
    decode_utf8(&raw, name)
}

fn decode_utf8(raw: &[u8], name: &str) -> DecodeResult<MqttString> {
    let s = std::str::from_utf8(raw)
        .map_err(|_| DecodeError::malformed(format!("malformed UTF-8 string for {name}")))?;
    if s.contains('\0') {
        return Err(DecodeError::malformed(format!(
            "malformed UTF-8 string for {name}: must not contain null character"
        )));
    }
    Ok(MqttString::from_validated(s.to_owned()))
}

// ============================================================================
// Property primitives
// ============================================================================

fn check_once<T>(slot: &Option<T>, name: &str) -> DecodeResult<()> {
    if slot.is_some() {
        return Err(DecodeError::more_than_once(name));
    }
    Ok(())
}

fn fixed_only_once<T: Copy>(
    slot: &mut Option<T>,
    name: &str,
    buf: &mut Bytes,
    width: usize,
    read: impl FnOnce(&mut Bytes) -> T,
    check: impl FnOnce(T) -> DecodeResult<()>,
) -> DecodeResult<T> {
    ensure(buf, width, name)?;
    check_once(slot, name)?;
    let value = read(buf);
    check(value)?;
    *slot = Some(value);
    Ok(value)
}

fn any<T>(_: T) -> DecodeResult<()> {
    Ok(())
}

fn non_zero<T: Default + PartialEq>(name: &str) -> impl FnOnce(T) -> DecodeResult<()> + '_ {
    move |value| {
        if value == T::default() {
            return Err(DecodeError::protocol(format!("{name} must not be 0")));
        }
        Ok(())
    }
}

/// Boolean property; only 0 and 1 are accepted.
pub fn boolean_only_once(slot: &mut Option<bool>, name: &str, buf: &mut Bytes) -> DecodeResult<bool> {
    ensure(buf, 1, name)?;
    check_once(slot, name)?;
    let value = match buf.get_u8() {
        0 => false,
        1 => true,
        other => {
            return Err(DecodeError::protocol(format!("malformed boolean for {name}: {other}")));
        }
    };
    *slot = Some(value);
    Ok(value)
}

pub fn u8_only_once(slot: &mut Option<u8>, name: &str, buf: &mut Bytes) -> DecodeResult<u8> {
    fixed_only_once(slot, name, buf, 1, |b| b.get_u8(), any)
}

pub fn u16_only_once(slot: &mut Option<u16>, name: &str, buf: &mut Bytes) -> DecodeResult<u16> {
    fixed_only_once(slot, name, buf, 2, |b| b.get_u16(), any)
}

/// Like [`u16_only_once`], zero is a protocol error.
pub fn non_zero_u16_only_once(slot: &mut Option<u16>, name: &str, buf: &mut Bytes) -> DecodeResult<u16> {
    fixed_only_once(slot, name, buf, 2, |b| b.get_u16(), non_zero(name))
}

pub fn u32_only_once(slot: &mut Option<u32>, name: &str, buf: &mut Bytes) -> DecodeResult<u32> {
    fixed_only_once(slot, name, buf, 4, |b| b.get_u32(), any)
}

/// Like [`u32_only_once`], zero is a protocol error.
pub fn non_zero_u32_only_once(slot: &mut Option<u32>, name: &str, buf: &mut Bytes) -> DecodeResult<u32> {
    fixed_only_once(slot, name, buf, 4, |b| b.get_u32(), non_zero(name))
}

pub fn utf8_only_once<'a>(
    slot: &'a mut Option<MqttString>,
    name: &str,
    buf: &mut Bytes,
) -> DecodeResult<&'a MqttString> {
    let len = prefixed_len(buf, name)?;
    check_once(slot, name)?;
    buf.advance(2);
    let value = decode_utf8(&buf.split_to(len), name)?;
    Ok(slot.insert(value))
}

pub fn binary_only_once<'a>(slot: &'a mut Option<Bytes>, name: &str, buf: &mut Bytes) -> DecodeResult<&'a Bytes> {
    let len = prefixed_len(buf, name)?;
    check_once(slot, name)?;
    buf.advance(2);
    Ok(slot.insert(buf.split_to(len)))
}

/// Repeatable variable byte integer property (subscription identifier).
/// Zero is a protocol error.
pub fn repeatable_variable_int(values: &mut Vec<u32>, name: &str, buf: &mut Bytes) -> DecodeResult<u32> {
    let value = variable_int(buf, name)?;
    non_zero(name)(value)?;
    values.push(value);
    Ok(value)
}

/// Repeatable user property; appended in wire order.
pub fn user_property(properties: &mut Vec<UserProperty>, buf: &mut Bytes) -> DecodeResult<()> {
    let name = read_string(buf, "user property name")?;
    let value = read_string(buf, "user property value")?;
    properties.push(UserProperty::new(name, value));
    Ok(())
}
