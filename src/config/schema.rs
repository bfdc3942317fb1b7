//! Configuration schema definitions.
//!
//! This module defines the configuration structure for the client transport.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::pool::PoolOptions;

/// Root configuration for the client transport.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TransportConfig {
    /// Connection pool settings.
    pub pool: PoolConfig,

    /// Load balancing settings.
    pub selector: SelectorConfig,
}

/// Connection pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Connections dialed when a sub-pool is created (0 acts as 1).
    pub initial_cap: usize,

    /// Maximum idle connections kept per destination address.
    pub max_cap: usize,

    /// Seconds an idle connection may sit before the checker evicts it.
    pub idle_timeout_secs: u64,

    /// Milliseconds allowed for a single dial attempt.
    pub dial_timeout_ms: u64,

    /// Seconds between health-checker sweeps.
    pub check_interval_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_cap: 1,
            max_cap: 1000,
            idle_timeout_secs: 60,
            dial_timeout_ms: 200,
            check_interval_secs: 3,
        }
    }
}

impl From<&PoolConfig> for PoolOptions {
    fn from(config: &PoolConfig) -> Self {
        Self {
            initial_cap: config.initial_cap,
            max_cap: config.max_cap,
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            dial_timeout: Duration::from_millis(config.dial_timeout_ms),
            check_interval: Duration::from_secs(config.check_interval_secs),
        }
    }
}

/// Load balancing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Strategy name: "round_robin" or "weighted_round_robin". Unknown
    /// names fall back to round robin.
    pub strategy: String,

    /// Seconds a per-service rotation state stays valid before it is
    /// recomputed.
    pub refresh_interval_secs: u64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            strategy: "round_robin".to_string(),
            refresh_interval_secs: 3 * 60,
        }
    }
}
