//! Request/response exchange over pooled, framed connections.

use std::sync::Arc;

use bytes::Bytes;

use crate::codec::frame;
use crate::config::TransportConfig;
use crate::error::{Result, TransportError};
use crate::pool::{ConnectionPool, DialFn, PoolOptions};
use crate::selector::{BalancerRegistry, Node, SharedBalancer};

/// The integration point callers use: one call turns request bytes into
/// response bytes against a balanced, pooled backend connection.
pub struct ClientTransport {
    pool: Arc<ConnectionPool>,
    balancer: SharedBalancer,
    network: String,
}

impl ClientTransport {
    /// Build from explicit parts.
    pub fn new(pool: Arc<ConnectionPool>, balancer: SharedBalancer) -> Self {
        Self {
            pool,
            balancer,
            network: "tcp".to_string(),
        }
    }

    /// Build from configuration, resolving the balancer through `registry`.
    pub fn from_config(config: &TransportConfig, registry: &BalancerRegistry) -> Self {
        let opts = PoolOptions::from(&config.pool);
        Self::new(
            Arc::new(ConnectionPool::new(opts)),
            registry.get(&config.selector.strategy),
        )
    }

    /// Like [`from_config`](Self::from_config) but dialing through `dial_fn`.
    pub fn from_config_with_dialer(
        config: &TransportConfig,
        registry: &BalancerRegistry,
        dial_fn: DialFn,
    ) -> Self {
        let opts = PoolOptions::from(&config.pool);
        Self::new(
            Arc::new(ConnectionPool::with_dialer(opts, dial_fn)),
            registry.get(&config.selector.strategy),
        )
    }

    /// Network passed to the dial function; "tcp" unless overridden.
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    /// Send `request` to one node of `service_name` and return the response
    /// payload.
    ///
    /// Balances across `nodes`, checks a connection out of the pool, writes
    /// the framed request and reads one framed response. The connection
    /// recycles on success; any failure after checkout faults it instead.
    pub async fn send(&self, service_name: &str, nodes: &[Node], request: &[u8]) -> Result<Bytes> {
        let node = self
            .balancer
            .balance(service_name, nodes)
            .ok_or_else(|| TransportError::NoAvailableNode(service_name.to_string()))?;
        tracing::trace!(service = service_name, node = %node.address, "node selected");

        let mut conn = self.pool.get(&self.network, &node.address).await?;

        let frame = frame::encode(request);
        conn.write_all(&frame).await?;

        let response = conn.read_frame().await?;
        Ok(frame::decode(response))
    }

    /// The pool behind this transport, for shutdown or sharing.
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }
}
