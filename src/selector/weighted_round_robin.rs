//! Smooth weighted round-robin strategy.
//!
//! Nginx-style smoothing: each pick adds every node's static weight to its
//! current weight, selects the node with the largest current weight, then
//! subtracts the total weight from the winner. Pick frequency converges to
//! the weight ratio without bursting on high-weight nodes.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::selector::{Balancer, Node, DEFAULT_REFRESH_INTERVAL};

/// Weighted round-robin selector with per-service state.
pub struct WeightedRoundRobinBalancer {
    pickers: DashMap<String, Mutex<Picker>>,
    refresh_interval: Duration,
}

struct WeightedNode {
    node: Node,
    weight: i64,
    current_weight: i64,
    /// Reserved for dynamic weight adjustment on failure; tracks the static
    /// weight until then.
    #[allow(dead_code)]
    effective_weight: i64,
}

struct Picker {
    nodes: Vec<WeightedNode>,
    last_refresh: Instant,
}

fn build_weighted(nodes: &[Node]) -> Vec<WeightedNode> {
    nodes
        .iter()
        .map(|node| WeightedNode {
            node: node.clone(),
            weight: node.weight as i64,
            current_weight: node.weight as i64,
            effective_weight: node.weight as i64,
        })
        .collect()
}

impl Picker {
    fn pick(&mut self, nodes: &[Node], refresh_interval: Duration) -> Option<Node> {
        if nodes.is_empty() {
            return None;
        }

        // Rebuild (replace, not patch) the weighted entries on refresh.
        if self.last_refresh.elapsed() > refresh_interval || nodes.len() != self.nodes.len() {
            self.nodes = build_weighted(nodes);
            self.last_refresh = Instant::now();
        }

        let mut total_weight = 0i64;
        let mut max_weight = i64::MIN;
        let mut winner = 0usize;
        for (i, wn) in self.nodes.iter_mut().enumerate() {
            wn.current_weight += wn.weight;
            total_weight += wn.weight;
            if wn.current_weight > max_weight {
                max_weight = wn.current_weight;
                winner = i;
            }
        }

        self.nodes[winner].current_weight -= total_weight;
        Some(self.nodes[winner].node.clone())
    }
}

impl WeightedRoundRobinBalancer {
    pub fn new() -> Self {
        Self::with_refresh_interval(DEFAULT_REFRESH_INTERVAL)
    }

    pub fn with_refresh_interval(refresh_interval: Duration) -> Self {
        Self {
            pickers: DashMap::new(),
            refresh_interval,
        }
    }
}

impl Default for WeightedRoundRobinBalancer {
    fn default() -> Self {
        Self::new()
    }
}

impl Balancer for WeightedRoundRobinBalancer {
    fn balance(&self, service_name: &str, nodes: &[Node]) -> Option<Node> {
        let picker = self
            .pickers
            .entry(service_name.to_string())
            .or_insert_with(|| {
                Mutex::new(Picker {
                    nodes: build_weighted(nodes),
                    last_refresh: Instant::now(),
                })
            });
        let mut picker = picker.lock().unwrap_or_else(|e| e.into_inner());
        picker.pick(nodes, self.refresh_interval)
    }
}
