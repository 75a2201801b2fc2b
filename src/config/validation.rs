//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Endpoint addresses present and unique
//! - Node ids unique, since pinning resolves them to one endpoint
//! - Fallback balancer compiles, since it is the last resort
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DriverConfig → Result<(), Vec<ValidationError>>
//! - The primary balancer string is not validated; a broken one degrades at runtime

use std::collections::HashSet;
use thiserror::Error;

use crate::balancers;
use crate::config::schema::DriverConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("endpoint #{index} has an empty address")]
    EmptyAddress { index: usize },

    #[error("node id {node_id} is used by more than one endpoint")]
    DuplicateNodeId { node_id: u32 },

    #[error("address {address} is used by more than one endpoint")]
    DuplicateAddress { address: String },

    #[error("fallback balancer '{config}' is invalid: {reason}")]
    InvalidFallback { config: String, reason: String },
}

pub fn validate_config(config: &DriverConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut node_ids = HashSet::new();
    let mut addresses = HashSet::new();

    for (index, endpoint) in config.endpoints.iter().enumerate() {
        if endpoint.address.is_empty() {
            errors.push(ValidationError::EmptyAddress { index });
        } else if !addresses.insert(endpoint.address.as_str()) {
            errors.push(ValidationError::DuplicateAddress {
                address: endpoint.address.clone(),
            });
        }
        if !node_ids.insert(endpoint.node_id) {
            errors.push(ValidationError::DuplicateNodeId {
                node_id: endpoint.node_id,
            });
        }
    }

    if let Some(fallback) = &config.balancer.fallback {
        if let Err(e) = balancers::create_from_config(fallback) {
            errors.push(ValidationError::InvalidFallback {
                config: fallback.clone(),
                reason: e.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
