//! # Runtime Configuration Module
//!
//! Settings that change routing behaviour, loaded from environment variables
//! or from the `settings` table of a route manifest.
//!
//! ## Environment Variables
//!
//! ### `WAYPOINT_DUPLICATE_POLICY`
//!
//! What registering an existing (method, pattern) pair does:
//! - `reject` (default): fail with `DuplicateRoute`, keep the first handler
//! - `overwrite`: replace the bound handler in place
//!
//! ### `WAYPOINT_HEAD_FALLBACK`
//!
//! `true` lets a `HEAD` request with no `HEAD` rule use the matching `GET`
//! rule. Default: `false`.
//!
//! ## Usage
//!
//! ```rust
//! use waypoint::runtime_config::{DuplicatePolicy, RouterConfig};
//!
//! let config = RouterConfig::from_env();
//! if config.duplicate_policy == DuplicatePolicy::Overwrite {
//!     println!("re-registering a route replaces its handler");
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::env;

/// What registering an already bound (method, pattern) pair does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail with `RouterError::DuplicateRoute`; the first registration stays bound
    #[default]
    Reject,
    /// Replace the handler, keeping the rule's position in the table
    Overwrite,
}

impl DuplicatePolicy {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => DuplicatePolicy::Overwrite,
            _ => DuplicatePolicy::Reject,
        }
    }
}

/// Routing behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub duplicate_policy: DuplicatePolicy,
    /// Resolve `HEAD` through a matching `GET` rule when no `HEAD` rule matches
    pub head_falls_back_to_get: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Reject,
            head_falls_back_to_get: false,
        }
    }
}

impl RouterConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            duplicate_policy: env::var("WAYPOINT_DUPLICATE_POLICY")
                .map(|v| DuplicatePolicy::parse(&v))
                .unwrap_or(defaults.duplicate_policy),
            head_falls_back_to_get: env_flag("WAYPOINT_HEAD_FALLBACK")
                .unwrap_or(defaults.head_falls_back_to_get),
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
        assert!(!config.head_falls_back_to_get);
    }

    #[test]
    fn test_parse_policy_and_flags() {
        assert_eq!(DuplicatePolicy::parse("Overwrite"), DuplicatePolicy::Overwrite);
        assert_eq!(DuplicatePolicy::parse("bogus"), DuplicatePolicy::Reject);
        assert_eq!(parse_flag("ON"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_partial_deserialization_keeps_defaults() {
        let config: RouterConfig = toml::from_str("duplicate_policy = \"overwrite\"").unwrap();
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Overwrite);
        assert!(!config.head_falls_back_to_get);
    }
}
