//! Client-side endpoint routing for a distributed database driver.
//!
//! Discovered endpoints are held in an immutable [`Cluster`] snapshot that
//! picks an endpoint per call, honoring node pinning, locality preference
//! and fallback. Balancer config strings compile into a [`Policy`]
//! describing how that snapshot is built.

pub mod balancers;
pub mod cluster;
pub mod config;
pub mod context;
pub mod endpoint;
pub mod observability;
pub mod random;

pub use balancers::{create_from_config, from_config, CompileError, FromConfigOptions, Policy};
pub use cluster::{Cluster, ClusterHandle, ClusterOptions, SelectError};
pub use config::DriverConfig;
pub use context::{CallContext, Canceller};
pub use endpoint::{Endpoint, EndpointInfo};
