//! Frame layout and codec.
//!
//! # Responsibilities
//! - Define the wire constants (header length, magic, payload bound)
//! - Encode a payload into header + body
//! - Decode a validated frame back into its payload

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Size of the fixed frame header in bytes.
pub const FRAME_HEADER_LEN: usize = 15;

/// Magic byte every frame must start with.
pub const MAGIC: u8 = 0x11;

/// Current protocol version.
pub const VERSION: u8 = 0;

/// Upper bound on a frame's payload length.
pub const MAX_PAYLOAD_LEN: u32 = 4 * 1024 * 1024;

/// Initial size of a framer's scratch buffer.
pub const DEFAULT_PAYLOAD_LEN: usize = 1024;

/// The fixed 15-byte frame header.
///
/// Layout on the wire (big-endian):
/// byte 0 magic, byte 1 version, byte 2 message type, byte 3 request type,
/// byte 4 compression flag, bytes 5-6 stream id, bytes 7-10 payload length,
/// bytes 11-14 reserved.
///
/// `msg_type` 0x0 is a normal message, 0x1 a heartbeat. `req_type` 0x0 is
/// send-receive, 0x1 send-only, 0x2/0x3/0x4 client/server/bidirectional
/// streaming. Only 0 values are produced today; the fields exist so the
/// header does not change shape when those message kinds arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub magic: u8,
    pub version: u8,
    pub msg_type: u8,
    pub req_type: u8,
    pub compress_type: u8,
    pub stream_id: u16,
    pub length: u32,
    pub reserved: u32,
}

impl FrameHeader {
    /// Header for a normal request/response frame carrying `length` bytes.
    pub fn for_payload(length: u32) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            msg_type: 0,
            req_type: 0,
            compress_type: 0,
            stream_id: 0,
            length,
            reserved: 0,
        }
    }

    /// Parse a header from its 15-byte wire form.
    ///
    /// Does not validate field values; the framer decides what to reject.
    pub fn parse(mut buf: &[u8]) -> Self {
        debug_assert!(buf.len() >= FRAME_HEADER_LEN);
        Self {
            magic: buf.get_u8(),
            version: buf.get_u8(),
            msg_type: buf.get_u8(),
            req_type: buf.get_u8(),
            compress_type: buf.get_u8(),
            stream_id: buf.get_u16(),
            length: buf.get_u32(),
            reserved: buf.get_u32(),
        }
    }

    /// Append the 15-byte wire form of this header to `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_u8(self.magic);
        buf.put_u8(self.version);
        buf.put_u8(self.msg_type);
        buf.put_u8(self.req_type);
        buf.put_u8(self.compress_type);
        buf.put_u16(self.stream_id);
        buf.put_u32(self.length);
        buf.put_u32(self.reserved);
    }
}

/// Build a complete frame from a request/response payload.
pub fn encode(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + payload.len());
    FrameHeader::for_payload(payload.len() as u32).encode_into(&mut buf);
    buf.put_slice(payload);
    buf.freeze()
}

/// Strip the header from a complete frame, leaving the payload.
///
/// The frame must have come from [`Framer::read_frame`](crate::codec::Framer),
/// which has already validated the header; no re-validation happens here.
pub fn decode(frame: Bytes) -> Bytes {
    frame.slice(FRAME_HEADER_LEN..)
}
