//! Balancer config compilation errors.

use thiserror::Error;

/// Errors that can occur while compiling a balancer config string.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The `type` is not one of the known balancer identifiers.
    #[error("unknown type of balancer: {0}")]
    UnknownBalancerType(String),

    /// The string is neither an identifier nor a valid config document.
    #[error("malformed balancer config: {0}")]
    MalformedConfiguration(#[from] serde_json::Error),

    /// `prefer = "locations"` without any location.
    #[error("empty locations list in balancer '{balancer}' config")]
    EmptyLocationsList { balancer: String },
}
