//! Client transport subsystem.
//!
//! # Data Flow
//! ```text
//! send(service, nodes, request payload)
//!     → selector (pick one node)
//!     → pool (checked-out connection to that node)
//!     → codec (encode request, write, read response frame, decode)
//!     → response payload
//! ```
//!
//! # Design Decisions
//! - No retries here; callers re-invoke with fresh inputs if they want them
//! - Any failure after checkout faults the connection so it is never reused

pub mod client;

pub use client::ClientTransport;
