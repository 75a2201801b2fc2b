//! Balancing policies.
//!
//! # Data Flow
//! ```text
//! balancer config string ("random_choice" or JSON document)
//!     → config.rs (strict compile: create_from_config)
//!         → error.rs on unknown type / malformed document / empty locations
//!     → config.rs (degrading wrapper: from_config)
//!         → substitute policy + observer callback on any error
//!     → policy.rs (Policy descriptor)
//!     → Policy::cluster_options (filter, fallback, selection)
//!     → Cluster::new
//! ```
//!
//! # Design Decisions
//! - A policy is a recipe for a directory, not a runtime object
//! - The config vocabulary is a closed enum matched exhaustively
//! - A broken balancer config never stops the driver from connecting

pub mod config;
pub mod error;
pub mod policy;

pub use config::{create_from_config, from_config, BalancerType, FromConfigOptions};
pub use error::CompileError;
pub use policy::{Policy, Preference, Strategy};

/// Rotate through endpoints.
pub fn round_robin() -> Policy {
    Policy::new(Strategy::RoundRobin)
}

/// Pick a uniformly random endpoint per call.
pub fn random_choice() -> Policy {
    Policy::new(Strategy::RandomChoice)
}

/// Keep every call on one endpoint.
pub fn single_conn() -> Policy {
    Policy::new(Strategy::SingleConnection)
}

/// Balancing turned off: every call stays on the first endpoint.
pub fn disabled() -> Policy {
    Policy::new(Strategy::Disabled)
}

/// Substitute used when a balancer config can't be compiled.
pub fn default_policy() -> Policy {
    Policy::default()
}

/// Only endpoints in the local datacenter.
pub fn prefer_nearest_dc(base: Policy) -> Policy {
    base.with_preference(Preference::NearestDc).with_fallback(false)
}

/// Local datacenter first, any endpoint when it has none left.
pub fn prefer_nearest_dc_with_fallback(base: Policy) -> Policy {
    base.with_preference(Preference::NearestDc).with_fallback(true)
}

/// Only endpoints in one of `locations`. The list must not be empty.
pub fn prefer_locations<I, S>(base: Policy, locations: I) -> Result<Policy, CompileError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let preference = Preference::locations(&base.strategy, locations)?;
    Ok(base.with_preference(preference).with_fallback(false))
}

/// Endpoints in one of `locations` first, any endpoint otherwise.
pub fn prefer_locations_with_fallback<I, S>(base: Policy, locations: I) -> Result<Policy, CompileError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let preference = Preference::locations(&base.strategy, locations)?;
    Ok(base.with_preference(preference).with_fallback(true))
}
