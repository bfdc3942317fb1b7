//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Caller supplies (service name, candidate node list)
//!     → registry.rs (resolve strategy by name)
//!     → round_robin.rs / weighted_round_robin.rs
//!         → per-service picker state (concurrent map)
//!         → refresh when node count changes or the interval elapses
//!     → one selected Node, or None when the list is empty
//! ```
//!
//! # Design Decisions
//! - Node lists are supplied fresh by the caller on every call; the
//!   balancer never discovers nodes itself
//! - Picker state is keyed by service name so distinct services rotate
//!   independently
//! - Empty node list yields None, never an error

pub mod node;
pub mod registry;
pub mod round_robin;
pub mod weighted_round_robin;

use std::sync::Arc;
use std::time::Duration;

pub use node::Node;
pub use registry::BalancerRegistry;
pub use round_robin::RoundRobinBalancer;
pub use weighted_round_robin::WeightedRoundRobinBalancer;

/// How long picker rotation state stays valid before it is recomputed.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(3 * 60);

/// Node selection strategy.
pub trait Balancer: Send + Sync {
    /// Pick one node from `nodes` for `service_name`.
    ///
    /// Returns `None` when the list is empty (no healthy backend).
    fn balance(&self, service_name: &str, nodes: &[Node]) -> Option<Node>;
}

/// Shared handle to a balancer, as stored in the registry.
pub type SharedBalancer = Arc<dyn Balancer>;
