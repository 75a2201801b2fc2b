//! Driver configuration subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DriverConfig (validated, immutable)
//!     → balancer string compiled by balancers::from_config
//!     → endpoints handed to Policy::build_cluster
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → ReloadFilter drops it if balancer and endpoints are unchanged
//!     → compiled ClusterUpdate sent to the owner of the ClusterHandle
//!     → new Cluster built and published
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{BalancerConfig, DriverConfig, ObservabilityConfig};
pub use validation::{validate_config, ValidationError};
pub use watcher::{ClusterUpdate, ConfigWatcher, ReloadFilter};
