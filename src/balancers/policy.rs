//! Compiled balancer descriptor.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::balancers::error::CompileError;
use crate::cluster::{Cluster, ClusterOptions, Selection};
use crate::endpoint::Endpoint;

/// How an endpoint is chosen inside the tier being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    RoundRobin,
    RandomChoice,
    SingleConnection,
    /// Balancing turned off; served like `SingleConnection`.
    Disabled,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::RoundRobin => "round_robin",
            Strategy::RandomChoice => "random_choice",
            Strategy::SingleConnection => "single",
            Strategy::Disabled => "disable",
        }
    }

    fn selection(&self) -> Selection {
        match self {
            Strategy::RoundRobin => Selection::round_robin(),
            Strategy::RandomChoice => Selection::Random,
            Strategy::SingleConnection | Strategy::Disabled => Selection::First,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which endpoints go to the preferred tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "locations", rename_all = "snake_case")]
pub enum Preference {
    /// Every endpoint is preferred.
    None,
    /// Endpoints in the caller's local datacenter.
    NearestDc,
    /// Endpoints in one of the listed locations, stored upper-cased.
    Locations(Vec<String>),
}

impl Preference {
    /// Explicit locations preference; fails on an empty list.
    pub fn locations<I, S>(strategy: &Strategy, locations: I) -> Result<Self, CompileError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let locations: Vec<String> = locations
            .into_iter()
            .map(|l| l.as_ref().to_uppercase())
            .collect();
        if locations.is_empty() {
            return Err(CompileError::EmptyLocationsList {
                balancer: strategy.to_string(),
            });
        }
        Ok(Preference::Locations(locations))
    }
}

/// A balancing policy: strategy, locality preference, fallback permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Policy {
    pub strategy: Strategy,
    pub preference: Preference,
    pub allow_fallback: bool,
}

impl Policy {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            preference: Preference::None,
            allow_fallback: false,
        }
    }

    pub fn with_preference(mut self, preference: Preference) -> Self {
        self.preference = preference;
        self
    }

    pub fn with_fallback(mut self, allow_fallback: bool) -> Self {
        self.allow_fallback = allow_fallback;
        self
    }

    /// Directory options realizing this policy.
    ///
    /// `local_dc` is the datacenter resolved for this client; it is only
    /// consulted by [`Preference::NearestDc`].
    pub fn cluster_options<E: Endpoint + ?Sized>(&self, local_dc: Option<&str>) -> ClusterOptions<E> {
        let options = ClusterOptions::new()
            .with_fallback(self.allow_fallback)
            .with_selection(self.strategy.selection());

        match &self.preference {
            Preference::None => options,
            Preference::NearestDc => match local_dc {
                Some(dc) => {
                    let dc = dc.to_uppercase();
                    options.with_filter(move |e: &E| e.location().to_uppercase() == dc)
                }
                None => {
                    tracing::warn!(
                        balancer = %self.strategy,
                        "Local datacenter unknown, nearest_dc preference accepts every endpoint"
                    );
                    options
                }
            },
            Preference::Locations(locations) => {
                let locations = locations.clone();
                options.with_filter(move |e: &E| locations.contains(&e.location().to_uppercase()))
            }
        }
    }

    /// Build a directory over `endpoints` following this policy.
    pub fn build_cluster<E, I>(&self, endpoints: I, local_dc: Option<&str>) -> Cluster<E>
    where
        E: Endpoint + ?Sized,
        I: IntoIterator<Item = Arc<E>>,
    {
        Cluster::new(endpoints, self.cluster_options(local_dc))
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::new(Strategy::RoundRobin)
    }
}
