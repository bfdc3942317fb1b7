//! Client-side RPC transport core.
//!
//! Given a logical service name, pick a healthy backend node, obtain a
//! reusable connection to it, and exchange length-delimited binary frames
//! over that connection.
//!
//! # Architecture Overview
//!
//! ```text
//!  send(service, nodes, request)
//!      │
//!      ▼
//!  ┌──────────┐  node   ┌──────────┐  conn   ┌──────────────┐
//!  │ selector │────────▶│   pool   │────────▶│    codec     │
//!  │ rr / wrr │         │ sub-pool │         │ frame/framer │
//!  └──────────┘         │ per addr │         └──────────────┘
//!                       └────┬─────┘
//!                            │ background checker per sub-pool
//!                            ▼
//!                  evict idle / half-dead connections
//! ```
//!
//! Service discovery, dispatch, interceptors, TLS and serialization above
//! the frame payload all live outside this crate; the node list is supplied
//! by the caller on every send.

// Core subsystems
pub mod codec;
pub mod pool;
pub mod selector;
pub mod transport;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod observability;

pub use config::TransportConfig;
pub use error::{Result, TransportError};
pub use pool::{ConnectionPool, PoolOptions, PooledConn};
pub use selector::{Balancer, BalancerRegistry, Node};
pub use transport::ClientTransport;
