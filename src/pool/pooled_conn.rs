//! Checked-out connection handle.
//!
//! # Responsibilities
//! - Delegate reads and writes to the raw stream
//! - Mark the connection faulted on any I/O or protocol error and close it
//! - Recycle a usable connection into its sub-pool on drop

use bytes::Bytes;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::codec::Framer;
use crate::error::{Result, TransportError};
use crate::pool::connection_pool::SubPool;
use crate::pool::BoxedStream;

/// Connection lifecycle state.
///
/// `Faulted` is terminal: the stream has already been closed and the handle
/// will not be recycled. A usable handle recycles into its sub-pool when
/// dropped, so "close" means "return for reuse" unless the connection has
/// faulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Usable,
    Faulted,
}

/// A connection checked out of a sub-pool.
///
/// Exclusively owned by the holder; ownership moves back to the sub-pool's
/// idle list on drop. The handle carries its own [`Framer`] so the frame
/// scratch buffer follows the connection across checkouts.
pub struct PooledConn {
    stream: Option<BoxedStream>,
    framer: Option<Framer>,
    state: ConnState,
    pool: Arc<SubPool>,
}

impl PooledConn {
    pub(crate) fn new(stream: BoxedStream, framer: Framer, pool: Arc<SubPool>) -> Self {
        Self {
            stream: Some(stream),
            framer: Some(framer),
            state: ConnState::Usable,
            pool,
        }
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    /// Close the stream and bar this handle from the pool. Idempotent.
    pub fn mark_faulted(&mut self) {
        self.state = ConnState::Faulted;
        // Dropping the stream closes it.
        self.stream = None;
    }

    /// Read up to `buf.len()` bytes. An error or end-of-stream closes the
    /// connection and propagates; a faulted handle fails without touching
    /// the socket.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let stream = self.stream_mut()?;
        match stream.read(buf).await {
            // The peer hung up: this connection can never carry another
            // response, so it must not go back to the idle list.
            Ok(0) if !buf.is_empty() => {
                self.mark_faulted();
                Err(TransportError::ConnectionClosed)
            }
            Ok(n) => Ok(n),
            Err(e) => {
                self.mark_faulted();
                Err(e.into())
            }
        }
    }

    /// Write up to `buf.len()` bytes, with the same fault semantics as
    /// [`read`](Self::read).
    pub async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let stream = self.stream_mut()?;
        match stream.write(buf).await {
            Ok(n) => Ok(n),
            Err(e) => {
                self.mark_faulted();
                Err(e.into())
            }
        }
    }

    /// Write the whole buffer.
    pub async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let stream = self.stream_mut()?;
        match stream.write_all(buf).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.mark_faulted();
                Err(e.into())
            }
        }
    }

    /// Read one complete frame using this connection's framer.
    ///
    /// Any failure, protocol or I/O, leaves the stream in an unknown
    /// position, so the connection is faulted either way.
    pub async fn read_frame(&mut self) -> Result<Bytes> {
        if self.state == ConnState::Faulted {
            return Err(TransportError::ConnectionClosed);
        }
        let (stream, framer) = match (self.stream.as_mut(), self.framer.as_mut()) {
            (Some(stream), Some(framer)) => (stream, framer),
            _ => return Err(TransportError::ConnectionClosed),
        };
        match framer.read_frame(stream).await {
            Ok(frame) => Ok(frame),
            Err(e) => {
                self.mark_faulted();
                Err(e)
            }
        }
    }

    fn stream_mut(&mut self) -> Result<&mut BoxedStream> {
        if self.state == ConnState::Faulted {
            return Err(TransportError::ConnectionClosed);
        }
        self.stream
            .as_mut()
            .ok_or(TransportError::ConnectionClosed)
    }
}

impl std::fmt::Debug for PooledConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConn")
            .field("state", &self.state)
            .field("connected", &self.stream.is_some())
            .finish()
    }
}

impl Drop for PooledConn {
    fn drop(&mut self) {
        if self.state == ConnState::Usable {
            if let (Some(stream), Some(framer)) = (self.stream.take(), self.framer.take()) {
                self.pool.put(stream, framer);
            }
        }
        // Faulted: the stream is already gone; nothing returns to the pool.
    }
}
