//! Pool lifecycle tests against real TCP backends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use conduit_rpc::pool::{ConnState, ConnectionPool, PoolOptions};
use conduit_rpc::TransportError;

mod common;

fn fast_checker_opts(idle_timeout: Duration) -> PoolOptions {
    PoolOptions {
        idle_timeout,
        check_interval: Duration::from_millis(50),
        ..PoolOptions::default()
    }
}

#[tokio::test]
async fn checker_keeps_healthy_idle_connection() {
    let addr = common::start_echo_server().await;
    let dials = Arc::new(AtomicUsize::new(0));
    let pool = ConnectionPool::with_dialer(
        fast_checker_opts(Duration::from_secs(60)),
        common::counting_tcp_dialer(Arc::clone(&dials)),
    );

    let conn = pool.get("tcp", &addr.to_string()).await.unwrap();
    drop(conn);

    // Several sweeps pass; the quiet connection must survive them.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let conn = pool.get("tcp", &addr.to_string()).await.unwrap();
    assert_eq!(conn.state(), ConnState::Usable);
    assert_eq!(dials.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn checker_evicts_idle_expired_connection() {
    let addr = common::start_echo_server().await;
    let dials = Arc::new(AtomicUsize::new(0));
    let pool = ConnectionPool::with_dialer(
        fast_checker_opts(Duration::from_millis(10)),
        common::counting_tcp_dialer(Arc::clone(&dials)),
    );

    let conn = pool.get("tcp", &addr.to_string()).await.unwrap();
    drop(conn);

    tokio::time::sleep(Duration::from_millis(300)).await;

    // The idle connection aged out and was evicted, so this dials afresh.
    let _conn = pool.get("tcp", &addr.to_string()).await.unwrap();
    assert_eq!(dials.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn checker_evicts_hung_up_connection() {
    let addr = common::start_hangup_server().await;
    let dials = Arc::new(AtomicUsize::new(0));
    let pool = ConnectionPool::with_dialer(
        fast_checker_opts(Duration::from_secs(60)),
        common::counting_tcp_dialer(Arc::clone(&dials)),
    );

    let conn = pool.get("tcp", &addr.to_string()).await.unwrap();
    drop(conn);

    // The peer dropped its end at accept time; the read probe sees EOF.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let _conn = pool.get("tcp", &addr.to_string()).await.unwrap();
    assert_eq!(dials.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn faulted_connection_does_not_reenter_rotation() {
    let addr = common::start_hangup_server().await;
    let dials = Arc::new(AtomicUsize::new(0));
    let pool = ConnectionPool::with_dialer(
        PoolOptions::default(),
        common::counting_tcp_dialer(Arc::clone(&dials)),
    );

    let mut conn = pool.get("tcp", &addr.to_string()).await.unwrap();
    // Peer already hung up; the frame read fails and faults the connection.
    assert!(conn.read_frame().await.is_err());
    assert_eq!(conn.state(), ConnState::Faulted);
    drop(conn);

    let _next = pool.get("tcp", &addr.to_string()).await.unwrap();
    assert_eq!(dials.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn dial_failure_surfaces_as_connectivity_error() {
    let pool = ConnectionPool::new(PoolOptions::default());
    // Nothing listens on this port.
    match pool.get("tcp", "127.0.0.1:1").await {
        Err(TransportError::Dial { .. }) | Err(TransportError::DialTimeout { .. }) => {}
        other => panic!("expected a dial error, got {other:?}"),
    }
}

#[tokio::test]
async fn closed_pool_rejects_get() {
    let addr = common::start_echo_server().await;
    let pool = ConnectionPool::new(PoolOptions::default());
    pool.get("tcp", &addr.to_string()).await.unwrap();

    pool.close();
    match pool.get("tcp", &addr.to_string()).await {
        Err(TransportError::PoolClosed) => {}
        other => panic!("expected PoolClosed, got {other:?}"),
    }
}

#[tokio::test]
async fn unsupported_network_is_a_dial_error() {
    let pool = ConnectionPool::new(PoolOptions::default());
    match pool.get("udp", "127.0.0.1:9000").await {
        Err(TransportError::Dial { source, .. }) => {
            assert_eq!(source.kind(), std::io::ErrorKind::Unsupported)
        }
        other => panic!("expected Dial error, got {other:?}"),
    }
}
