//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::balancers::{self, FromConfigOptions, Policy};
use crate::endpoint::EndpointInfo;

/// Root configuration of the driver's routing layer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DriverConfig {
    /// Balancer selection.
    pub balancer: BalancerConfig,

    /// Statically known endpoints.
    pub endpoints: Vec<EndpointInfo>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl DriverConfig {
    /// Endpoints as shared handles, in file order.
    pub fn endpoint_handles(&self) -> Vec<Arc<EndpointInfo>> {
        self.endpoints.iter().cloned().map(Arc::new).collect()
    }
}

/// Balancer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Balancer identifier or JSON document.
    pub config: String,

    /// Balancer to use when `config` does not compile.
    pub fallback: Option<String>,

    /// Datacenter this client runs in, for `nearest_dc`.
    pub local_dc: Option<String>,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            config: "round_robin".to_string(),
            fallback: None,
            local_dc: None,
        }
    }
}

impl BalancerConfig {
    /// Compile `config`, degrading to `fallback` (or the default policy).
    ///
    /// `fallback` itself is expected to have passed validation; if it still
    /// fails to compile the default policy is used.
    pub fn policy<F>(&self, on_error: F) -> Policy
    where
        F: Fn(&balancers::CompileError) + Send + Sync + 'static,
    {
        let mut options = FromConfigOptions::new().with_parse_error_handler(on_error);
        if let Some(fallback) = &self.fallback {
            match balancers::create_from_config(fallback) {
                Ok(policy) => options = options.with_parse_error_fallback(policy),
                Err(e) => {
                    tracing::warn!(error = %e, fallback = %fallback, "Invalid fallback balancer, using default");
                }
            }
        }
        balancers::from_config(&self.config, options)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balancers::{Preference, Strategy};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_minimal_config() {
        let config: DriverConfig = toml::from_str("").unwrap();
        assert_eq!(config.balancer.config, "round_robin");
        assert!(config.endpoints.is_empty());
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_full_config() {
        let config: DriverConfig = toml::from_str(
            r#"
            [balancer]
            config = '{"type":"random_choice","prefer":"locations","locations":["VLA"]}'
            fallback = "single"
            local_dc = "VLA"

            [[endpoints]]
            node_id = 1
            address = "grpc://a:2135"
            location = "VLA"

            [[endpoints]]
            node_id = 2
            address = "grpc://b:2135"
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints[1].location, "");
        assert_eq!(config.balancer.local_dc.as_deref(), Some("VLA"));

        let policy = config.balancer.policy(|_| {});
        assert_eq!(policy.strategy, Strategy::RandomChoice);
        assert_eq!(policy.preference, Preference::Locations(vec!["VLA".into()]));
    }

    #[test]
    fn test_policy_uses_configured_fallback() {
        let balancer = BalancerConfig {
            config: "weighted".into(),
            fallback: Some("single".into()),
            local_dc: None,
        };
        let errors = Arc::new(AtomicUsize::new(0));
        let seen = errors.clone();
        let policy = balancer.policy(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(policy, balancers::single_conn());
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }
}
