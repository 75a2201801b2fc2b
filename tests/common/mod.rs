//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use endpoint_balancer::random::Rand;
use endpoint_balancer::EndpointInfo;

/// Endpoint `n` lives at `node-n:2135` in `location`.
pub fn endpoint(node_id: u32, location: &str) -> Arc<EndpointInfo> {
    Arc::new(EndpointInfo::new(node_id, format!("node-{}:2135", node_id), location))
}

/// A random source that always answers the same index.
#[derive(Debug)]
pub struct FixedRand(pub usize);

impl Rand for FixedRand {
    fn int(&self, n: usize) -> usize {
        self.0 % n
    }
}

/// A random source counting how often it was asked.
#[derive(Debug, Default)]
pub struct CountingRand {
    pub calls: AtomicUsize,
}

impl Rand for CountingRand {
    fn int(&self, n: usize) -> usize {
        self.calls.fetch_add(1, Ordering::SeqCst) % n
    }
}

pub fn node_ids(endpoints: &[Arc<EndpointInfo>]) -> Vec<u32> {
    endpoints.iter().map(|e| e.node_id).collect()
}
