//! Backend node representation.

/// A candidate backend endpoint.
///
/// Immutable once handed to a balancer for a given round; the caller may
/// replace the whole list between rounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Opaque endpoint address, e.g. "127.0.0.1:8000".
    pub address: String,
    /// Static weight, used by the weighted strategy.
    pub weight: u32,
}

impl Node {
    pub fn new(address: impl Into<String>, weight: u32) -> Self {
        Self {
            address: address.into(),
            weight,
        }
    }
}
