//! Endpoint directory and selection.
//!
//! # Data Flow
//! ```text
//! discovery endpoints + ClusterOptions (filter, fallback, selection)
//!     → Cluster::new (partition into prefer / fallback, build node index)
//!     → ClusterHandle::publish (atomic swap of the current snapshot)
//!
//! Per call:
//!     CallContext (pinned node id, cancellation, deadline)
//!     → Cluster::next
//!         - context invalid      → CancelledOrExpired
//!         - pinned id in index   → that endpoint
//!         - prefer non-empty     → selection.rs over prefer
//!         - fallback non-empty   → selection.rs over fallback
//!         - otherwise            → NoEndpointsAvailable
//!
//! Transport failure on an endpoint:
//!     → Cluster::without (new snapshot, endpoint demoted or dropped)
//!     → ClusterHandle::evict (swap)
//! ```
//!
//! # Design Decisions
//! - Snapshots are immutable; every change builds a new one
//! - The random source and the round-robin cursor are the only shared state
//! - Eviction changes routing priority, never membership bookkeeping

pub mod error;
pub mod handle;
pub mod selection;
pub mod snapshot;

pub use error::{CancelReason, SelectError};
pub use handle::ClusterHandle;
pub use selection::Selection;
pub use snapshot::{Cluster, ClusterOptions, Filter};
