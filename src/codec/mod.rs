//! Wire framing subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound:
//!     request payload
//!     → frame.rs (prepend 15-byte big-endian header)
//!     → stream write
//!
//! Inbound:
//!     stream read
//!     → framer.rs (read header, validate magic/length, read body)
//!     → frame.rs (strip header)
//!     → response payload
//! ```
//!
//! # Design Decisions
//! - Header is fixed at 15 bytes regardless of payload size
//! - All multi-byte header fields are big-endian
//! - Validation happens on read (framer); decode is a plain header strip
//! - One framer per connection so its scratch buffer amortizes allocation

pub mod frame;
pub mod framer;

pub use frame::{decode, encode, FrameHeader};
pub use framer::Framer;
