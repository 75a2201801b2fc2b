//! Observability subsystem.
//!
//! Library code only emits `tracing` events with structured fields
//! (`node_id`, `address`, tier sizes). Installing a subscriber is left to
//! the embedding application; the `balancer` binary does it through
//! [`logging::init`].

pub mod logging;
