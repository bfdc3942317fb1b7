//! Reading complete frames off a stream.
//!
//! # Responsibilities
//! - Read exactly one frame (header + body) per call
//! - Validate the header before touching the body
//! - Reuse one scratch buffer across reads on the same connection

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::codec::frame::{self, FRAME_HEADER_LEN, MAGIC, MAX_PAYLOAD_LEN};
use crate::error::{Result, TransportError};

/// Cap on how many times the scratch buffer may double.
const MAX_RESIZES: u32 = 12;

/// Reads length-delimited frames from a stream connection.
///
/// One framer is attached to each connection. Its scratch buffer grows to
/// the largest payload seen on that connection and is never shrunk, so a
/// long-lived connection stops allocating after its first large frame; the
/// flip side is that one oversized frame inflates that connection's memory
/// for good.
#[derive(Debug)]
pub struct Framer {
    buffer: Vec<u8>,
    resize_count: u32,
}

impl Framer {
    pub fn new() -> Self {
        Self {
            buffer: vec![0; frame::DEFAULT_PAYLOAD_LEN],
            resize_count: 0,
        }
    }

    /// Read one complete frame, returning header + body as a single buffer.
    ///
    /// Short reads and I/O errors surface as-is. A bad magic byte or a
    /// length above [`MAX_PAYLOAD_LEN`] is a protocol error and the body is
    /// not read; the connection should be discarded by the caller.
    pub async fn read_frame<S>(&mut self, stream: &mut S) -> Result<Bytes>
    where
        S: AsyncRead + Unpin,
    {
        let mut header = [0u8; FRAME_HEADER_LEN];
        stream.read_exact(&mut header).await?;

        if header[0] != MAGIC {
            return Err(TransportError::InvalidMagic {
                expected: MAGIC,
                actual: header[0],
            });
        }

        // Payload length lives at header bytes 7..11, big-endian.
        let length = u32::from_be_bytes([header[7], header[8], header[9], header[10]]);
        if length > MAX_PAYLOAD_LEN {
            return Err(TransportError::PayloadTooLarge {
                length,
                limit: MAX_PAYLOAD_LEN,
            });
        }

        while (self.buffer.len() as u32) < length && self.resize_count <= MAX_RESIZES {
            self.buffer = vec![0; self.buffer.len() * 2];
            self.resize_count += 1;
        }

        let body = &mut self.buffer[..length as usize];
        stream.read_exact(body).await?;

        let mut out = BytesMut::with_capacity(FRAME_HEADER_LEN + length as usize);
        out.put_slice(&header);
        out.put_slice(body);
        Ok(out.freeze())
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}
