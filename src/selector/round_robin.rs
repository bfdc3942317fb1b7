//! Plain round-robin strategy.
//!
//! Rotates through the node list in order, one step per pick. The rotation
//! cursor is recomputed when the node count changes or the refresh interval
//! elapses; a refresh restarts the rotation at index 0.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::selector::{Balancer, Node, DEFAULT_REFRESH_INTERVAL};

/// Round-robin selector with per-service rotation state.
pub struct RoundRobinBalancer {
    pickers: DashMap<String, Mutex<Picker>>,
    refresh_interval: Duration,
}

struct Picker {
    /// Node count the cursor was computed against.
    known_length: usize,
    last_refresh: Instant,
    last_index: usize,
}

impl Picker {
    fn pick(&mut self, nodes: &[Node], refresh_interval: Duration) -> Option<Node> {
        if nodes.is_empty() {
            return None;
        }

        if self.last_refresh.elapsed() > refresh_interval || nodes.len() != self.known_length {
            self.known_length = nodes.len();
            self.last_refresh = Instant::now();
            self.last_index = 0;
            return Some(nodes[0].clone());
        }

        if self.last_index >= nodes.len() - 1 {
            self.last_index = 0;
        } else {
            self.last_index += 1;
        }
        Some(nodes[self.last_index].clone())
    }
}

impl RoundRobinBalancer {
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

impl Default for RoundRobinBalancer {
    fn default() -> Self {
        Self::new()
    }
}

impl Balancer for RoundRobinBalancer {
    fn balance(&self, service_name: &str, nodes: &[Node]) -> Option<Node> {
        let picker = self
            .pickers
            .entry(service_name.to_string())
            .or_insert_with(|| {
                Mutex::new(Picker {
                    // Zero so the first pick refreshes and starts at node 0.
                    known_length: 0,
                    last_refresh: Instant::now(),
                    last_index: 0,
                })
            });
        let mut picker = picker.lock().unwrap_or_else(|e| e.into_inner());
        picker.pick(nodes, self.refresh_interval)
    }
}
