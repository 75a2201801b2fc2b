//! Immutable directory snapshot.
//!
//! # Responsibilities
//! - Partition discovered endpoints into preferred and fallback tiers
//! - Index endpoints by node id for pinned calls
//! - Pick an endpoint per call
//! - Derive a new snapshot with failed endpoints demoted

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::cluster::error::SelectError;
use crate::cluster::selection::Selection;
use crate::context::CallContext;
use crate::endpoint::Endpoint;
use crate::random::{LockedRand, Rand};

/// Membership predicate: `true` puts the endpoint in the preferred tier.
pub type Filter<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Construction options for [`Cluster`].
pub struct ClusterOptions<E: ?Sized> {
    filter: Option<Filter<E>>,
    allow_fallback: bool,
    selection: Selection,
    rand: Option<Arc<dyn Rand>>,
}

impl<E: ?Sized> ClusterOptions<E> {
    pub fn new() -> Self {
        Self {
            filter: None,
            allow_fallback: false,
            selection: Selection::default(),
            rand: None,
        }
    }

    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Keep endpoints rejected by the filter as a last resort.
    pub fn with_fallback(mut self, allow_fallback: bool) -> Self {
        self.allow_fallback = allow_fallback;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Inject the random source. A locked, entropy-seeded one is created otherwise.
    pub fn with_rand(mut self, rand: Arc<dyn Rand>) -> Self {
        self.rand = Some(rand);
        self
    }
}

impl<E: ?Sized> Default for ClusterOptions<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A directory snapshot.
///
/// Never mutated after construction; [`Cluster::without`] returns a new one.
pub struct Cluster<E: Endpoint + ?Sized> {
    filter: Filter<E>,
    allow_fallback: bool,

    index: HashMap<u32, Arc<E>>,

    prefer: Vec<Arc<E>>,
    fallback: Vec<Arc<E>>,
    all: Vec<Arc<E>>,

    selection: Selection,
    rand: Arc<dyn Rand>,
}

impl<E: Endpoint + ?Sized> Cluster<E> {
    /// Build a snapshot over the given endpoints.
    pub fn new<I>(endpoints: I, options: ClusterOptions<E>) -> Self
    where
        I: IntoIterator<Item = Arc<E>>,
    {
        let ClusterOptions {
            filter,
            allow_fallback,
            selection,
            rand,
        } = options;

        let filter: Filter<E> = match filter {
            Some(filter) => filter,
            None => Arc::new(|_: &E| true),
        };
        let rand: Arc<dyn Rand> = match rand {
            Some(rand) => rand,
            None => Arc::new(LockedRand::new()),
        };

        let endpoints: Vec<Arc<E>> = endpoints.into_iter().collect();
        let (prefer, fallback): (Vec<Arc<E>>, Vec<Arc<E>>) =
            endpoints.iter().cloned().partition(|e| filter(&**e));

        let (all, fallback) = if allow_fallback {
            (endpoints, fallback)
        } else {
            (prefer.clone(), Vec::new())
        };
        let index = all.iter().map(|e| (e.node_id(), e.clone())).collect();

        tracing::debug!(
            prefer = prefer.len(),
            fallback = fallback.len(),
            allow_fallback,
            "Cluster snapshot built"
        );

        Self {
            filter,
            allow_fallback,
            index,
            prefer,
            fallback,
            all,
            selection,
            rand,
        }
    }

    /// Pick the endpoint for one call.
    pub fn next(&self, ctx: &CallContext) -> Result<Arc<E>, SelectError> {
        if let Some(reason) = ctx.err() {
            return Err(SelectError::CancelledOrExpired(reason));
        }

        if let Some(node_id) = ctx.node_id() {
            if let Some(e) = self.index.get(&node_id) {
                return Ok(e.clone());
            }
            tracing::trace!(node_id, "Pinned node not in cluster, using policy");
        }

        if !self.prefer.is_empty() {
            return Ok(self.pick(&self.prefer));
        }

        if !self.fallback.is_empty() {
            return Ok(self.pick(&self.fallback));
        }

        Err(SelectError::NoEndpointsAvailable)
    }

    fn pick(&self, tier: &[Arc<E>]) -> Arc<E> {
        tier[self.selection.pick(tier.len(), self.rand.as_ref())].clone()
    }

    /// New snapshot with the given endpoints taken out of the preferred tier.
    ///
    /// Endpoints are matched by address. With fallback allowed they move to
    /// the fallback tier, otherwise they are dropped from routing. The full
    /// endpoint list and node index are carried over unchanged.
    pub fn without(&self, evicted: &[Arc<E>]) -> Self {
        let addresses: Vec<&str> = evicted.iter().map(|e| e.address()).collect();
        self.without_addresses(&addresses)
    }

    /// Same as [`Cluster::without`], keyed directly by address.
    pub fn without_addresses(&self, addresses: &[&str]) -> Self {
        let mut prefer = Vec::with_capacity(self.prefer.len());
        let mut fallback = self.fallback.clone();

        for e in &self.prefer {
            if addresses.contains(&e.address()) {
                tracing::debug!(
                    node_id = e.node_id(),
                    address = %e.address(),
                    demoted = self.allow_fallback,
                    "Endpoint evicted from preferred set"
                );
                if self.allow_fallback {
                    fallback.push(e.clone());
                }
            } else {
                prefer.push(e.clone());
            }
        }

        Self {
            filter: self.filter.clone(),
            allow_fallback: self.allow_fallback,
            index: self.index.clone(),
            prefer,
            fallback,
            all: self.all.clone(),
            selection: self.selection.clone(),
            rand: self.rand.clone(),
        }
    }

    /// Every endpoint this snapshot knows about.
    pub fn all(&self) -> &[Arc<E>] {
        &self.all
    }

    pub fn prefer(&self) -> &[Arc<E>] {
        &self.prefer
    }

    pub fn fallback(&self) -> &[Arc<E>] {
        &self.fallback
    }

    pub fn allow_fallback(&self) -> bool {
        self.allow_fallback
    }

    /// Whether `endpoint` satisfies this snapshot's membership predicate.
    pub fn is_preferred(&self, endpoint: &E) -> bool {
        (self.filter)(endpoint)
    }
}

impl<E: Endpoint + ?Sized> fmt::Debug for Cluster<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("allow_fallback", &self.allow_fallback)
            .field("prefer", &self.prefer)
            .field("fallback", &self.fallback)
            .field("all", &self.all.len())
            .field("selection", &self.selection)
            .finish()
    }
}
