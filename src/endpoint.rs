//! Endpoint abstraction.
//!
//! # Responsibilities
//! - Expose the stable node id used for pinning
//! - Expose the network address used for eviction matching
//! - Expose the locality used by preference filters

use serde::{Deserialize, Serialize};
use std::fmt;

/// A routable server node as seen by the balancer.
///
/// Endpoints are produced by discovery; the balancer only holds shared
/// references to them.
pub trait Endpoint: Send + Sync + fmt::Debug + 'static {
    /// Node identifier, unique within a discovery epoch.
    fn node_id(&self) -> u32;

    /// Network address. Two endpoints with the same address are the same
    /// endpoint for eviction purposes.
    fn address(&self) -> &str;

    /// Locality (datacenter) the node lives in.
    fn location(&self) -> &str;
}

/// Plain endpoint description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointInfo {
    pub node_id: u32,
    pub address: String,
    #[serde(default)]
    pub location: String,
}

impl EndpointInfo {
    pub fn new(node_id: u32, address: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            node_id,
            address: address.into(),
            location: location.into(),
        }
    }
}

impl Endpoint for EndpointInfo {
    fn node_id(&self) -> u32 {
        self.node_id
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn location(&self) -> &str {
        &self.location
    }
}

impl fmt::Display for EndpointInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.address, self.node_id)
    }
}
