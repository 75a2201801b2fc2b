//! Balancer config compilation.
//!
//! Accepts either a bare balancer identifier or a JSON document:
//!
//! ```text
//! random_choice
//! {"type": "random_choice", "prefer": "locations", "locations": ["VLA"], "fallback": true}
//! ```

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::balancers::error::CompileError;
use crate::balancers::policy::Policy;
use crate::balancers::{
    default_policy, disabled, prefer_locations, prefer_locations_with_fallback, prefer_nearest_dc,
    prefer_nearest_dc_with_fallback, random_choice, round_robin, single_conn,
};

/// Balancer identifiers accepted in config strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalancerType {
    RoundRobin,
    RandomChoice,
    Single,
    Disable,
}

impl BalancerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalancerType::RoundRobin => "round_robin",
            BalancerType::RandomChoice => "random_choice",
            BalancerType::Single => "single",
            BalancerType::Disable => "disable",
        }
    }

    /// The policy this identifier names.
    pub fn policy(&self) -> Policy {
        match self {
            BalancerType::RoundRobin => round_robin(),
            BalancerType::RandomChoice => random_choice(),
            BalancerType::Single => single_conn(),
            BalancerType::Disable => disabled(),
        }
    }
}

impl FromStr for BalancerType {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "round_robin" => Ok(BalancerType::RoundRobin),
            "random_choice" => Ok(BalancerType::RandomChoice),
            "single" => Ok(BalancerType::Single),
            "disable" => Ok(BalancerType::Disable),
            other => Err(CompileError::UnknownBalancerType(other.to_string())),
        }
    }
}

impl fmt::Display for BalancerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const PREFER_NEAREST_DC: &str = "nearest_dc";
const PREFER_LOCATIONS: &str = "locations";
// Deprecated alias of `nearest_dc`, to be removed after March 2025.
const PREFER_LOCAL_DC: &str = "local_dc";

/// Structured form of a balancer config.
///
/// An explicit `null` reads the same as an absent field.
#[derive(Debug, Deserialize)]
struct BalancerDocument {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    prefer: Option<String>,
    #[serde(default)]
    fallback: Option<bool>,
    #[serde(default)]
    locations: Option<Vec<String>>,
}

/// Compile a balancer config string, failing on any error.
pub fn create_from_config(s: &str) -> Result<Policy, CompileError> {
    if let Ok(kind) = s.parse::<BalancerType>() {
        return Ok(kind.policy());
    }

    let doc: BalancerDocument = serde_json::from_str(s)?;
    let kind: BalancerType = doc.kind.unwrap_or_default().parse()?;
    let base = kind.policy();
    let fallback = doc.fallback.unwrap_or_default();
    let locations = doc.locations.unwrap_or_default();

    match doc.prefer.as_deref() {
        None => Ok(base),
        Some(PREFER_NEAREST_DC) | Some(PREFER_LOCAL_DC) => {
            if doc.prefer.as_deref() == Some(PREFER_LOCAL_DC) {
                tracing::warn!(
                    balancer = %kind,
                    "Balancer preference 'local_dc' is deprecated, use 'nearest_dc'"
                );
            }
            if fallback {
                Ok(prefer_nearest_dc_with_fallback(base))
            } else {
                Ok(prefer_nearest_dc(base))
            }
        }
        Some(PREFER_LOCATIONS) => {
            if locations.is_empty() {
                return Err(CompileError::EmptyLocationsList {
                    balancer: kind.to_string(),
                });
            }
            if fallback {
                prefer_locations_with_fallback(base, &locations)
            } else {
                prefer_locations(base, &locations)
            }
        }
        Some(other) => {
            tracing::warn!(balancer = %kind, prefer = %other, "Unknown balancer preference ignored");
            Ok(base)
        }
    }
}

/// Observer for compilation errors swallowed by [`from_config`].
pub type ErrorHandler = Box<dyn Fn(&CompileError) + Send + Sync>;

/// Behavior of [`from_config`] when compilation fails.
#[derive(Default)]
pub struct FromConfigOptions {
    fallback: Option<Policy>,
    error_handler: Option<ErrorHandler>,
}

impl FromConfigOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy to use instead of the default when compilation fails.
    pub fn with_parse_error_fallback(mut self, policy: Policy) -> Self {
        self.fallback = Some(policy);
        self
    }

    /// Called with the error whenever compilation fails.
    pub fn with_parse_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&CompileError) + Send + Sync + 'static,
    {
        self.error_handler = Some(Box::new(handler));
        self
    }
}

impl fmt::Debug for FromConfigOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromConfigOptions")
            .field("fallback", &self.fallback)
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}

/// Compile a balancer config string, degrading to a substitute on error.
pub fn from_config(s: &str, options: FromConfigOptions) -> Policy {
    match create_from_config(s) {
        Ok(policy) => policy,
        Err(err) => {
            let fallback = options.fallback.unwrap_or_else(default_policy);
            tracing::warn!(
                error = %err,
                fallback = %fallback.strategy,
                "Invalid balancer config, using fallback balancer"
            );
            if let Some(handler) = &options.error_handler {
                handler(&err);
            }
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balancers::Preference;

    #[test]
    fn test_balancer_type_round_trip() {
        for kind in [
            BalancerType::RoundRobin,
            BalancerType::RandomChoice,
            BalancerType::Single,
            BalancerType::Disable,
        ] {
            assert_eq!(kind.as_str().parse::<BalancerType>().unwrap(), kind);
        }
    }

    #[test]
    fn test_identifier_is_exact() {
        assert!(" single".parse::<BalancerType>().is_err());
        assert!("SINGLE".parse::<BalancerType>().is_err());
    }

    #[test]
    fn test_missing_type() {
        let err = create_from_config(r#"{"prefer":"nearest_dc"}"#).unwrap_err();
        match err {
            CompileError::UnknownBalancerType(t) => assert_eq!(t, ""),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_null_fields_read_as_absent() {
        let err = create_from_config(r#"{"type":"random_choice","prefer":"locations","locations":null}"#)
            .unwrap_err();
        assert!(matches!(err, CompileError::EmptyLocationsList { .. }));

        let p = create_from_config(r#"{"type":"random_choice","prefer":"nearest_dc","fallback":null}"#).unwrap();
        assert_eq!(p.preference, Preference::NearestDc);
        assert!(!p.allow_fallback);

        let err = create_from_config(r#"{"type":null}"#).unwrap_err();
        assert!(matches!(err, CompileError::UnknownBalancerType(ref t) if t.is_empty()));
    }

    #[test]
    fn test_unknown_preference_is_ignored() {
        let p = create_from_config(r#"{"type":"single","prefer":"closest","fallback":true}"#).unwrap();
        assert_eq!(p, single_conn());
    }

    #[test]
    fn test_local_dc_alias() {
        let a = create_from_config(r#"{"type":"round_robin","prefer":"local_dc"}"#).unwrap();
        let b = create_from_config(r#"{"type":"round_robin","prefer":"nearest_dc"}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.preference, Preference::NearestDc);
        assert!(!a.allow_fallback);
    }

    #[test]
    fn test_substitute_fallback() {
        let p = from_config(
            r#"{"type":"weighted"}"#,
            FromConfigOptions::new().with_parse_error_fallback(single_conn()),
        );
        assert_eq!(p, single_conn());
    }

    #[test]
    fn test_success_skips_handler() {
        let p = from_config(
            "random_choice",
            FromConfigOptions::new().with_parse_error_handler(|err| panic!("unexpected: {err}")),
        );
        assert_eq!(p, random_choice());
    }
}
