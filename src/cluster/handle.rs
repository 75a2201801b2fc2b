//! Atomic publication of directory snapshots.
//!
//! Readers load the current snapshot without locking; writers build a new
//! snapshot and swap it in, so a reader sees either the old or the new one.

use arc_swap::ArcSwapOption;
use std::sync::Arc;

use crate::cluster::error::SelectError;
use crate::cluster::snapshot::Cluster;
use crate::context::CallContext;
use crate::endpoint::Endpoint;

/// Holder of the current [`Cluster`], empty until the first discovery.
pub struct ClusterHandle<E: Endpoint + ?Sized> {
    current: ArcSwapOption<Cluster<E>>,
}

impl<E: Endpoint + ?Sized> ClusterHandle<E> {
    /// An uninitialized handle.
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
        }
    }

    /// Replace the current snapshot, returning the previous one.
    pub fn publish(&self, cluster: Cluster<E>) -> Option<Arc<Cluster<E>>> {
        let prev = self.current.swap(Some(Arc::new(cluster)));
        tracing::debug!(replaced = prev.is_some(), "Cluster snapshot published");
        prev
    }

    pub fn load(&self) -> Option<Arc<Cluster<E>>> {
        self.current.load_full()
    }

    pub fn is_initialized(&self) -> bool {
        self.current.load().is_some()
    }

    /// Pick an endpoint from the current snapshot.
    pub fn next(&self, ctx: &CallContext) -> Result<Arc<E>, SelectError> {
        let current = self.current.load();
        match current.as_ref() {
            Some(cluster) => cluster.next(ctx),
            None => Err(SelectError::UninitializedDirectory),
        }
    }

    /// Endpoints of the current snapshot; empty when uninitialized.
    pub fn all(&self) -> Vec<Arc<E>> {
        let current = self.current.load();
        match current.as_ref() {
            Some(cluster) => cluster.all().to_vec(),
            None => Vec::new(),
        }
    }

    /// Swap in a snapshot with `evicted` taken out of the preferred tier.
    ///
    /// Returns `false` when there is no snapshot to evict from.
    pub fn evict(&self, evicted: &[Arc<E>]) -> bool {
        let prev = self
            .current
            .rcu(|current| current.as_ref().map(|cluster| Arc::new(cluster.without(evicted))));
        prev.is_some()
    }
}

impl<E: Endpoint + ?Sized> Default for ClusterHandle<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Endpoint + ?Sized> From<Cluster<E>> for ClusterHandle<E> {
    fn from(cluster: Cluster<E>) -> Self {
        Self {
            current: ArcSwapOption::from_pointee(cluster),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterOptions;
    use crate::endpoint::EndpointInfo;

    fn cluster() -> Cluster<EndpointInfo> {
        Cluster::new(
            vec![
                Arc::new(EndpointInfo::new(1, "a:2135", "VLA")),
                Arc::new(EndpointInfo::new(2, "b:2135", "VLA")),
            ],
            ClusterOptions::new().with_fallback(true),
        )
    }

    #[test]
    fn test_uninitialized() {
        let handle: ClusterHandle<EndpointInfo> = ClusterHandle::new();
        assert!(!handle.is_initialized());
        assert_eq!(
            handle.next(&CallContext::background()).unwrap_err(),
            SelectError::UninitializedDirectory
        );
        assert!(handle.all().is_empty());
        assert!(!handle.evict(&[Arc::new(EndpointInfo::new(1, "a:2135", "VLA"))]));
        assert!(!handle.is_initialized());
    }

    #[test]
    fn test_publish_and_replace() {
        let handle = ClusterHandle::new();
        assert!(handle.publish(cluster()).is_none());
        assert!(handle.next(&CallContext::background()).is_ok());

        let prev = handle.publish(Cluster::new(Vec::new(), ClusterOptions::new()));
        assert_eq!(prev.unwrap().all().len(), 2);
        assert_eq!(
            handle.next(&CallContext::background()).unwrap_err(),
            SelectError::NoEndpointsAvailable
        );
    }

    #[test]
    fn test_evict_swaps_snapshot() {
        let handle = ClusterHandle::from(cluster());
        let before = handle.load().unwrap();
        let evicted = before.prefer()[0].clone();

        assert!(handle.evict(&[evicted.clone()]));

        let after = handle.load().unwrap();
        assert_eq!(after.prefer().len(), 1);
        assert_eq!(after.fallback()[0].address, evicted.address);
        // readers holding the old snapshot are unaffected
        assert_eq!(before.prefer().len(), 2);
        assert_eq!(handle.all().len(), 2);
    }
}
