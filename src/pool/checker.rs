//! Background health checking of idle connections.
//!
//! # Responsibilities
//! - Periodically sweep a sub-pool's idle FIFO
//! - Evict connections idle past `idle_timeout`
//! - Evict half-dead connections (peer hung up, or sent data nobody asked
//!   for) before a caller can check them out
//!
//! # Design Decisions
//! - One task per sub-pool, stopped by the sub-pool's shutdown channel
//! - Eviction outcomes are logged, never surfaced to callers

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::sync::broadcast;
use tokio::time;

use crate::pool::connection_pool::{IdleConn, SubPool};
use crate::pool::BoxedStream;

/// Window granted to the one-byte liveness probe.
const PROBE_TIMEOUT: Duration = Duration::from_millis(1);

/// Checker loop for one sub-pool. Runs until the shutdown signal fires.
pub(crate) async fn run(sub_pool: Arc<SubPool>, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = time::interval(sub_pool.options().check_interval);
    // Consume the immediate first tick so sweeps start one period in.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                sweep(&sub_pool).await;
            }
            _ = shutdown.recv() => {
                tracing::debug!(address = %sub_pool.address(), "checker received shutdown signal, exiting");
                break;
            }
        }
    }
}

/// One sweep: examine up to the current idle length, re-queueing healthy
/// connections with their idle timestamps intact.
async fn sweep(sub_pool: &SubPool) {
    let length = sub_pool.idle_len();
    for _ in 0..length {
        let Some(mut conn) = sub_pool.pop_idle() else {
            break;
        };
        if healthy(&mut conn, sub_pool.options().idle_timeout).await {
            sub_pool.put_idle(conn);
        } else {
            tracing::debug!(address = %sub_pool.address(), "evicting unhealthy idle connection");
            drop(conn);
        }
    }
}

async fn healthy(conn: &mut IdleConn, idle_timeout: Duration) -> bool {
    if conn.idle_since.elapsed() > idle_timeout {
        return false;
    }
    alive(&mut conn.stream).await
}

/// One-byte read probe under a very short deadline.
///
/// A quiet stream (probe times out) is alive. EOF or an error means the
/// peer is gone. A readable byte on an idle request/response connection
/// means the stream is desynchronized, so it is treated as dead too.
async fn alive(stream: &mut BoxedStream) -> bool {
    let mut probe = [0u8; 1];
    match time::timeout(PROBE_TIMEOUT, stream.read(&mut probe)).await {
        Err(_) => true,
        Ok(Ok(0)) => false,
        Ok(Ok(_)) => false,
        Ok(Err(_)) => false,
    }
}
