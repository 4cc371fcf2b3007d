//! Async read adapter over [`Decoder`].

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::decoder::Decoder;
use crate::error::{Error, Result};
use crate::packet::Packet;

const READ_CHUNK: usize = 4096;

/// Read a single packet from an async reader.
///
/// `buf` carries bytes across calls: anything read past the returned packet
/// stays in it for the next call.
pub async fn read_packet<R: AsyncRead + Unpin>(
    reader: &mut R,
    decoder: &mut Decoder,
    buf: &mut BytesMut,
) -> Result<Packet> {
    loop {
        if decoder.is_terminated() {
            return Err(Error::Terminated);
        }
        if !buf.is_empty() {
            if let Some(packet) = decoder.decode(buf)? {
                return Ok(packet);
            }
        }

        let mut tmp = [0u8; READ_CHUNK];
        let n = reader.read(&mut tmp).await?;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        buf.extend_from_slice(&tmp[..n]);
    }
}
