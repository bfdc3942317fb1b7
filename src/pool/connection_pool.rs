//! Pool of sub-pools, one per destination address.
//!
//! # Responsibilities
//! - Lazily construct a sub-pool per address, with eager initial dials
//! - Hand out pooled connections (idle pop, else on-demand dial)
//! - Accept returned connections back into the idle FIFO
//! - Close sub-pools and stop their checker tasks

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::codec::Framer;
use crate::error::{Result, TransportError};
use crate::pool::pooled_conn::PooledConn;
use crate::pool::{checker, tcp_dialer, BoxedStream, DialFn, PoolOptions};

/// Per-destination connection pool with reuse across requests.
pub struct ConnectionPool {
    sub_pools: DashMap<String, Arc<SubPool>>,
    opts: PoolOptions,
    dial_fn: DialFn,
    closed: AtomicBool,
}

impl ConnectionPool {
    /// Pool using the default TCP dialer.
    pub fn new(opts: PoolOptions) -> Self {
        Self::with_dialer(opts, tcp_dialer())
    }

    /// Pool with an injected dial function.
    pub fn with_dialer(opts: PoolOptions, dial_fn: DialFn) -> Self {
        Self {
            sub_pools: DashMap::new(),
            opts,
            dial_fn,
            closed: AtomicBool::new(false),
        }
    }

    /// Check out a connection to `address`, creating the sub-pool on first
    /// use.
    ///
    /// Dialing is bounded by `dial_timeout`; callers wanting an earlier
    /// deadline wrap the returned future in their own timeout. Dropping the
    /// future cancels an in-flight dial.
    pub async fn get(&self, network: &str, address: &str) -> Result<PooledConn> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::PoolClosed);
        }

        if let Some(sub) = self
            .sub_pools
            .get(address)
            .map(|entry| Arc::clone(entry.value()))
        {
            return sub.get().await;
        }

        let sub = SubPool::open(
            network,
            address,
            self.opts.clone(),
            Arc::clone(&self.dial_fn),
        )
        .await?;

        // Concurrent first-callers race to publish; the first insert wins
        // and the loser's sub-pool is shut down, not an error.
        let winner = match self.sub_pools.entry(address.to_string()) {
            Entry::Occupied(existing) => {
                sub.close();
                Arc::clone(existing.get())
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&sub));
                sub
            }
        };

        // close() may have run between the entry check above and the
        // publish; a sub-pool published after the clear would keep its
        // checker alive past the pool, so shut it down here instead.
        if self.closed.load(Ordering::Acquire) {
            winner.close();
            self.sub_pools.remove(address);
            return Err(TransportError::PoolClosed);
        }
        winner.get().await
    }

    /// Close every sub-pool, dropping all idle connections and stopping the
    /// checker tasks. Subsequent `get` calls fail with `PoolClosed`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        for entry in self.sub_pools.iter() {
            entry.value().close();
        }
        self.sub_pools.clear();
    }
}

impl Drop for ConnectionPool {
    fn drop(&mut self) {
        self.close();
    }
}

/// An idle connection parked in a sub-pool, keeping its framer so the
/// scratch buffer survives across checkouts.
pub(crate) struct IdleConn {
    pub(crate) stream: BoxedStream,
    pub(crate) framer: Framer,
    pub(crate) idle_since: Instant,
}

pub(crate) struct IdleState {
    pub(crate) idle: VecDeque<IdleConn>,
    pub(crate) closed: bool,
}

/// The per-address free list plus the dial recipe for that address.
pub struct SubPool {
    network: String,
    address: String,
    opts: PoolOptions,
    dial_fn: DialFn,
    state: Mutex<IdleState>,
    shutdown_tx: broadcast::Sender<()>,
}

impl SubPool {
    /// Construct the sub-pool: eager-dial `initial_cap` connections (all or
    /// nothing), then start the background checker.
    pub(crate) async fn open(
        network: &str,
        address: &str,
        opts: PoolOptions,
        dial_fn: DialFn,
    ) -> Result<Arc<Self>> {
        let initial_cap = opts.initial_cap.max(1);

        let mut idle = VecDeque::with_capacity(initial_cap);
        for _ in 0..initial_cap {
            let stream = dial_stream(&dial_fn, network, address, opts.dial_timeout).await?;
            idle.push_back(IdleConn {
                stream,
                framer: Framer::new(),
                idle_since: Instant::now(),
            });
        }

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let sub = Arc::new(Self {
            network: network.to_string(),
            address: address.to_string(),
            opts,
            dial_fn,
            state: Mutex::new(IdleState {
                idle,
                closed: false,
            }),
            shutdown_tx,
        });

        tokio::spawn(checker::run(Arc::clone(&sub), shutdown_rx));
        tracing::debug!(address = %sub.address, initial_cap, "sub-pool created");
        Ok(sub)
    }

    /// Non-blocking idle pop; falls through to an on-demand dial.
    pub(crate) async fn get(self: &Arc<Self>) -> Result<PooledConn> {
        let popped = {
            let mut state = self.lock_state();
            if state.closed {
                return Err(TransportError::PoolClosed);
            }
            state.idle.pop_front()
        };

        if let Some(idle) = popped {
            return Ok(PooledConn::new(idle.stream, idle.framer, Arc::clone(self)));
        }

        let stream = dial_stream(
            &self.dial_fn,
            &self.network,
            &self.address,
            self.opts.dial_timeout,
        )
        .await?;
        Ok(PooledConn::new(stream, Framer::new(), Arc::clone(self)))
    }

    /// Return a connection to the idle FIFO. A full or closed sub-pool
    /// drops the connection instead; neither is an error.
    pub(crate) fn put(&self, stream: BoxedStream, framer: Framer) {
        self.put_idle(IdleConn {
            stream,
            framer,
            idle_since: Instant::now(),
        });
    }

    /// Like `put` but keeps the existing idle timestamp, for the checker
    /// re-queueing connections it found healthy.
    pub(crate) fn put_idle(&self, conn: IdleConn) {
        let discarded = {
            let mut state = self.lock_state();
            if state.closed || state.idle.len() >= self.opts.max_cap {
                Some(conn)
            } else {
                state.idle.push_back(conn);
                None
            }
        };
        if discarded.is_some() {
            tracing::trace!(address = %self.address, "idle list full or closed, dropping connection");
        }
    }

    /// Mark closed under the lock, then drop every idle connection and stop
    /// the checker.
    pub(crate) fn close(&self) {
        let drained = {
            let mut state = self.lock_state();
            if state.closed {
                return;
            }
            state.closed = true;
            std::mem::take(&mut state.idle)
        };
        drop(drained);
        let _ = self.shutdown_tx.send(());
        tracing::debug!(address = %self.address, "sub-pool closed");
    }

    /// Receiver on the shutdown channel signaled by `close`.
    #[cfg(test)]
    pub(crate) fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub(crate) fn idle_len(&self) -> usize {
        let state = self.lock_state();
        if state.closed {
            0
        } else {
            state.idle.len()
        }
    }

    pub(crate) fn pop_idle(&self) -> Option<IdleConn> {
        self.lock_state().idle.pop_front()
    }

    pub(crate) fn options(&self) -> &PoolOptions {
        &self.opts
    }

    pub(crate) fn address(&self) -> &str {
        &self.address
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, IdleState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

async fn dial_stream(
    dial_fn: &DialFn,
    network: &str,
    address: &str,
    dial_timeout: Duration,
) -> Result<BoxedStream> {
    let fut = (dial_fn)(network.to_string(), address.to_string());
    match tokio::time::timeout(dial_timeout, fut).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(source)) => {
            tracing::warn!(network, address, error = %source, "dial failed");
            Err(TransportError::Dial {
                network: network.to_string(),
                address: address.to_string(),
                source,
            })
        }
        Err(_) => {
            tracing::warn!(network, address, ?dial_timeout, "dial timed out");
            Err(TransportError::DialTimeout {
                network: network.to_string(),
                address: address.to_string(),
                timeout: dial_timeout,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Dialer handing out in-memory duplex streams, counting invocations.
    fn duplex_dialer(count: Arc<AtomicUsize>) -> DialFn {
        Arc::new(move |_network, _address| {
            count.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                let (client, _server) = tokio::io::duplex(1024);
                Ok(Box::new(client) as BoxedStream)
            }) as crate::pool::DialFuture
        })
    }

    fn failing_dialer() -> DialFn {
        Arc::new(|_network, address| {
            Box::pin(async move {
                Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    format!("refused: {address}"),
                ))
            }) as crate::pool::DialFuture
        })
    }

    #[tokio::test]
    async fn get_reuses_returned_connection() {
        let dials = Arc::new(AtomicUsize::new(0));
        let pool = ConnectionPool::with_dialer(PoolOptions::default(), duplex_dialer(dials.clone()));

        let conn = pool.get("tcp", "10.0.0.1:9000").await.unwrap();
        assert_eq!(dials.load(Ordering::SeqCst), 1); // eager initial dial served it
        drop(conn); // recycled

        let _conn = pool.get("tcp", "10.0.0.1:9000").await.unwrap();
        assert_eq!(dials.load(Ordering::SeqCst), 1); // no new dial
    }

    #[tokio::test]
    async fn empty_idle_list_dials_on_demand() {
        let dials = Arc::new(AtomicUsize::new(0));
        let pool = ConnectionPool::with_dialer(PoolOptions::default(), duplex_dialer(dials.clone()));

        let first = pool.get("tcp", "10.0.0.1:9000").await.unwrap();
        let second = pool.get("tcp", "10.0.0.1:9000").await.unwrap();
        assert_eq!(dials.load(Ordering::SeqCst), 2);
        drop(first);
        drop(second);
    }

    #[tokio::test]
    async fn eager_dial_failure_fails_pool_construction() {
        let pool = ConnectionPool::with_dialer(PoolOptions::default(), failing_dialer());
        match pool.get("tcp", "10.0.0.1:9000").await {
            Err(TransportError::Dial { address, .. }) => assert_eq!(address, "10.0.0.1:9000"),
            other => panic!("expected Dial error, got {other:?}"),
        }
        // No partial sub-pool was published.
        assert!(pool.sub_pools.is_empty());
    }

    #[tokio::test]
    async fn full_idle_list_drops_extra_connection() {
        let dials = Arc::new(AtomicUsize::new(0));
        let opts = PoolOptions {
            max_cap: 1,
            ..PoolOptions::default()
        };
        let pool = ConnectionPool::with_dialer(opts, duplex_dialer(dials.clone()));

        let first = pool.get("tcp", "10.0.0.1:9000").await.unwrap();
        let second = pool.get("tcp", "10.0.0.1:9000").await.unwrap();
        drop(first); // fills the single idle slot
        drop(second); // no room: dropped, not queued

        let sub = Arc::clone(pool.sub_pools.get("10.0.0.1:9000").unwrap().value());
        assert_eq!(sub.idle_len(), 1);
    }

    #[tokio::test]
    async fn get_after_close_fails() {
        let dials = Arc::new(AtomicUsize::new(0));
        let pool = ConnectionPool::with_dialer(PoolOptions::default(), duplex_dialer(dials.clone()));
        pool.get("tcp", "10.0.0.1:9000").await.unwrap();

        pool.close();
        match pool.get("tcp", "10.0.0.1:9000").await {
            Err(TransportError::PoolClosed) => {}
            other => panic!("expected PoolClosed, got {other:?}"),
        }
    }

    /// Dialer that parks until released, so tests can interleave close()
    /// with an in-flight first dial.
    fn gated_dialer(gate: Arc<tokio::sync::Notify>) -> DialFn {
        Arc::new(move |_network, _address| {
            let gate = gate.clone();
            Box::pin(async move {
                gate.notified().await;
                let (client, _server) = tokio::io::duplex(1024);
                Ok(Box::new(client) as BoxedStream)
            }) as crate::pool::DialFuture
        })
    }

    #[tokio::test]
    async fn close_during_first_dial_does_not_publish_sub_pool() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let pool = Arc::new(ConnectionPool::with_dialer(
            PoolOptions::default(),
            gated_dialer(gate.clone()),
        ));

        let task = tokio::spawn({
            let pool = Arc::clone(&pool);
            async move { pool.get("tcp", "10.0.0.1:9000").await }
        });
        // Let the get pass the closed check and park in the dial.
        tokio::task::yield_now().await;
        pool.close();
        gate.notify_one();

        match task.await.unwrap() {
            Err(TransportError::PoolClosed) => {}
            other => panic!("expected PoolClosed, got {other:?}"),
        }
        assert!(pool.sub_pools.is_empty());
    }

    #[tokio::test]
    async fn put_to_closed_sub_pool_drops_connection() {
        let dials = Arc::new(AtomicUsize::new(0));
        let pool = ConnectionPool::with_dialer(PoolOptions::default(), duplex_dialer(dials.clone()));

        let conn = pool.get("tcp", "10.0.0.1:9000").await.unwrap();
        let sub = Arc::clone(pool.sub_pools.get("10.0.0.1:9000").unwrap().value());
        sub.close();

        drop(conn); // recycle path hits the closed sub-pool
        assert_eq!(sub.idle_len(), 0);
    }

    #[tokio::test]
    async fn zero_initial_cap_dials_one_connection() {
        let dials = Arc::new(AtomicUsize::new(0));
        let opts = PoolOptions {
            initial_cap: 0,
            ..PoolOptions::default()
        };
        let pool = ConnectionPool::with_dialer(opts, duplex_dialer(dials.clone()));
        let _conn = pool.get("tcp", "10.0.0.1:9000").await.unwrap();
        assert_eq!(dials.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_addresses_get_distinct_sub_pools() {
        let dials = Arc::new(AtomicUsize::new(0));
        let pool = ConnectionPool::with_dialer(PoolOptions::default(), duplex_dialer(dials.clone()));
        let _a = pool.get("tcp", "10.0.0.1:9000").await.unwrap();
        let _b = pool.get("tcp", "10.0.0.2:9000").await.unwrap();
        assert_eq!(pool.sub_pools.len(), 2);
    }
}
