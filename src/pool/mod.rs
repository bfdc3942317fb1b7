//! Connection pooling subsystem.
//!
//! # Data Flow
//! ```text
//! get(network, address)
//!     → connection_pool.rs (address → sub-pool map, lazy construction)
//!         → idle FIFO pop, or on-demand dial
//!     → pooled_conn.rs (delegating wrapper, Usable/Faulted state)
//!
//! Drop of a usable PooledConn
//!     → sub-pool idle FIFO (or closed when the FIFO is full)
//!
//! checker.rs (one task per sub-pool)
//!     → drains idle FIFO each tick
//!     → evicts idle-expired and half-dead connections
//!     → stops when the sub-pool closes
//! ```
//!
//! # Design Decisions
//! - Only idle capacity is bounded; checked-out connections may transiently
//!   exceed `max_cap`
//! - Dial is the only cancellable step: drop or timeout the `get` future
//! - A faulted connection is closed on the spot and never re-enters the pool
//! - The dial function is injectable so tests can count or fake dials

pub mod checker;
pub mod connection_pool;
pub mod pooled_conn;

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

pub use connection_pool::ConnectionPool;
pub use pooled_conn::{ConnState, PooledConn};

/// Any stream-oriented connection the pool can manage.
pub trait RawStream: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> RawStream for T {}

/// An owned, type-erased connection.
pub type BoxedStream = Box<dyn RawStream>;

pub type DialFuture = Pin<Box<dyn Future<Output = io::Result<BoxedStream>> + Send>>;

/// Dial seam: `(network, address) -> connection`.
///
/// The pool applies its own `dial_timeout` around the returned future and
/// does not care how bytes move below the connection abstraction.
pub type DialFn = Arc<dyn Fn(String, String) -> DialFuture + Send + Sync>;

/// Pool configuration knobs.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Connections dialed eagerly when a sub-pool is created. 0 is treated
    /// as 1.
    pub initial_cap: usize,
    /// Upper bound on idle connections per destination.
    pub max_cap: usize,
    /// Idle connections older than this are evicted by the checker.
    pub idle_timeout: Duration,
    /// Bound on a single dial attempt.
    pub dial_timeout: Duration,
    /// Period of the background health checker.
    pub check_interval: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            initial_cap: 1,
            max_cap: 1000,
            idle_timeout: Duration::from_secs(60),
            dial_timeout: Duration::from_millis(200),
            check_interval: Duration::from_secs(3),
        }
    }
}

/// Default dialer: TCP via tokio. Networks other than "tcp" are refused.
pub fn tcp_dialer() -> DialFn {
    Arc::new(|network: String, address: String| {
        Box::pin(async move {
            if network != "tcp" {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("unsupported network {network:?}"),
                ));
            }
            let stream = TcpStream::connect(&address).await?;
            Ok(Box::new(stream) as BoxedStream)
        }) as DialFuture
    })
}
