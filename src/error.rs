//! Error definitions for the transport core.
//!
//! # Design Decisions
//! - One enum across the codec, pool and selector layers; callers match
//!   on variants rather than downcasting
//! - Protocol errors are fatal to the current frame read; the connection
//!   that produced them is discarded, never retried
//! - No retries anywhere in this crate; retry policy belongs to the caller

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur in the client transport path.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Frame header carried the wrong magic byte.
    #[error("invalid magic: expected {expected:#04x}, got {actual:#04x}")]
    InvalidMagic { expected: u8, actual: u8 },

    /// Frame header advertised a payload larger than the allowed maximum.
    #[error("payload too large: {length} bytes exceeds limit of {limit}")]
    PayloadTooLarge { length: u32, limit: u32 },

    /// Dialing the backend failed.
    #[error("dial {network}://{address} failed: {source}")]
    Dial {
        network: String,
        address: String,
        #[source]
        source: io::Error,
    },

    /// Dialing the backend did not complete within the dial timeout.
    #[error("dial {network}://{address} timed out after {timeout:?}")]
    DialTimeout {
        network: String,
        address: String,
        timeout: Duration,
    },

    /// Operation on a connection that has already been marked faulted.
    #[error("connection closed")]
    ConnectionClosed,

    /// `get` on a sub-pool that has been closed.
    #[error("connection pool closed")]
    PoolClosed,

    /// The balancer had no node to offer for the service.
    #[error("no available node for service {0:?}")]
    NoAvailableNode(String),

    /// I/O error from the underlying stream.
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
