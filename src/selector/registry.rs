//! Balancer registry.
//!
//! # Design Decisions
//! - An explicit registry object, constructed once at startup and passed
//!   where lookup is needed, instead of a process-wide mutable table
//! - Unknown strategy names resolve to the default (plain round robin)

use std::sync::Arc;

use dashmap::DashMap;

use crate::selector::{RoundRobinBalancer, SharedBalancer, WeightedRoundRobinBalancer};

/// Strategy name for plain round robin.
pub const ROUND_ROBIN: &str = "round_robin";

/// Strategy name for smooth weighted round robin.
pub const WEIGHTED_ROUND_ROBIN: &str = "weighted_round_robin";

/// Name-keyed lookup of balancer strategies.
pub struct BalancerRegistry {
    balancers: DashMap<String, SharedBalancer>,
    default: SharedBalancer,
}

impl BalancerRegistry {
    /// Empty registry with `default` as the fallback strategy.
    pub fn new(default: SharedBalancer) -> Self {
        Self {
            balancers: DashMap::new(),
            default,
        }
    }

    /// Registry with both built-in strategies registered and plain round
    /// robin as the default.
    pub fn with_defaults() -> Self {
        let round_robin: SharedBalancer = Arc::new(RoundRobinBalancer::new());
        let registry = Self::new(Arc::clone(&round_robin));
        registry.register(ROUND_ROBIN, round_robin);
        registry.register(
            WEIGHTED_ROUND_ROBIN,
            Arc::new(WeightedRoundRobinBalancer::new()),
        );
        registry
    }

    /// Like [`with_defaults`](Self::with_defaults) but with a configured
    /// picker refresh interval on both strategies.
    pub fn with_refresh_interval(refresh_interval: std::time::Duration) -> Self {
        let round_robin: SharedBalancer =
            Arc::new(RoundRobinBalancer::with_refresh_interval(refresh_interval));
        let registry = Self::new(Arc::clone(&round_robin));
        registry.register(ROUND_ROBIN, round_robin);
        registry.register(
            WEIGHTED_ROUND_ROBIN,
            Arc::new(WeightedRoundRobinBalancer::with_refresh_interval(
                refresh_interval,
            )),
        );
        registry
    }

    /// Register a strategy under `name`, replacing any previous entry.
    pub fn register(&self, name: impl Into<String>, balancer: SharedBalancer) {
        self.balancers.insert(name.into(), balancer);
    }

    /// Resolve a strategy by name, falling back to the default.
    pub fn get(&self, name: &str) -> SharedBalancer {
        self.balancers
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .unwrap_or_else(|| Arc::clone(&self.default))
    }
}

impl Default for BalancerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
