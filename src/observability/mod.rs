//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via tracing; every subsystem emits events with
//!   address/service fields rather than formatted strings
//! - Metrics and distributed tracing belong to plugin layers above this
//!   crate and are not wired here

pub mod logging;
