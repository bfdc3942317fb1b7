//! Shared helpers for integration tests: in-process backends and dialers.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

use conduit_rpc::codec::{frame, Framer};
use conduit_rpc::pool::{BoxedStream, DialFn, DialFuture};

/// Start a framed echo server on an ephemeral port: every request frame is
/// answered with a frame carrying the same payload.
pub async fn start_echo_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut framer = Framer::new();
                loop {
                    let Ok(request) = framer.read_frame(&mut socket).await else {
                        break;
                    };
                    let reply = frame::encode(&frame::decode(request));
                    if socket.write_all(&reply).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    addr
}

/// Start a server that accepts connections and immediately hangs up,
/// simulating a remote restart between requests.
pub async fn start_hangup_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            drop(socket);
        }
    });

    addr
}

/// TCP dialer that counts how many times it is invoked.
pub fn counting_tcp_dialer(count: Arc<AtomicUsize>) -> DialFn {
    Arc::new(move |_network, address| {
        let count = Arc::clone(&count);
        Box::pin(async move {
            count.fetch_add(1, Ordering::SeqCst);
            let stream = TcpStream::connect(&address).await?;
            Ok(Box::new(stream) as BoxedStream)
        }) as DialFuture
    })
}
