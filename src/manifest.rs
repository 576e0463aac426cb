//! # Route Manifest
//!
//! Declarative route tables loaded from YAML, TOML or JSON and applied onto a
//! [`Router`] through the ordinary registration API, so every registration
//! rule (method set, pattern syntax, duplicates, handler resolution) holds.
//!
//! Handlers and middleware are referenced by name and resolve against the
//! router's [`crate::registry::Registry`].
//!
//! ```yaml
//! settings:
//!   duplicate_policy: reject
//!   head_falls_back_to_get: true
//! middleware: [auth]
//! routes:
//!   - methods: [GET, POST]
//!     pattern: /
//!     handler: Home::index
//! groups:
//!   - prefix: /api
//!     routes:
//!       - methods: GET
//!         pattern: /user/{id:\d+}
//!         handler: Users::show
//!     groups:
//!       - prefix: /admin
//!         routes:
//!           - { methods: DELETE, pattern: "/user/{id}", handler: Admin::remove }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::RouterError;
use crate::handlers::named;
use crate::registry::Registry;
use crate::router::Router;
use crate::runtime_config::RouterConfig;

/// On-disk manifest format, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Toml,
    Json,
}

impl ManifestFormat {
    /// `.yaml` / `.yml` and `.toml` by extension; anything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml" | "yml") => ManifestFormat::Yaml,
            Some("toml") => ManifestFormat::Toml,
            _ => ManifestFormat::Json,
        }
    }
}

/// One method token or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MethodList {
    One(String),
    Many(Vec<String>),
}

impl MethodList {
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            MethodList::One(method) => vec![method.clone()],
            MethodList::Many(methods) => methods.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    #[serde(alias = "method")]
    pub methods: MethodList,
    pub pattern: String,
    /// Registry key, e.g. `health` or `Users::show`
    pub handler: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub prefix: String,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteManifest {
    /// Replaces the router's configuration before anything is registered
    pub settings: Option<RouterConfig>,
    /// Named middleware appended in order
    pub middleware: Vec<String>,
    pub routes: Vec<RouteEntry>,
    pub groups: Vec<GroupEntry>,
}

impl RouteManifest {
    /// Read and parse a manifest file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or does not parse as its format.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read route manifest {}", path.display()))?;
        let manifest = Self::parse(&content, ManifestFormat::from_path(path))
            .with_context(|| format!("Failed to parse route manifest {}", path.display()))?;
        info!(
            path = %path.display(),
            routes = manifest.route_count(),
            middleware = manifest.middleware.len(),
            "Route manifest loaded"
        );
        Ok(manifest)
    }

    /// Parse manifest text.
    ///
    /// # Errors
    ///
    /// Fails when `content` does not deserialize as `format`.
    pub fn parse(content: &str, format: ManifestFormat) -> Result<Self> {
        let manifest = match format {
            ManifestFormat::Yaml => serde_yaml::from_str(content)?,
            ManifestFormat::Toml => toml::from_str(content)?,
            ManifestFormat::Json => serde_json::from_str(content)?,
        };
        Ok(manifest)
    }

    /// Route entries across all groups, counting each entry once.
    #[must_use]
    pub fn route_count(&self) -> usize {
        fn count(groups: &[GroupEntry]) -> usize {
            groups
                .iter()
                .map(|g| g.routes.len() + count(&g.groups))
                .sum()
        }
        self.routes.len() + count(&self.groups)
    }

    /// Register everything in this manifest onto `router`.
    ///
    /// Settings first, then middleware, then top-level routes, then groups,
    /// each in file order.
    ///
    /// # Errors
    ///
    /// The first registration error. Rules registered before it stay in the
    /// table.
    pub fn apply(&self, router: &mut Router) -> Result<(), RouterError> {
        if let Some(settings) = &self.settings {
            router.set_config(settings.clone());
        }
        for name in &self.middleware {
            router.use_named(name)?;
        }
        apply_routes(router, &self.routes)?;
        apply_groups(router, &self.groups)
    }

    /// Build a fresh router over `registry` and apply this manifest to it.
    ///
    /// # Errors
    ///
    /// See [`RouteManifest::apply`].
    pub fn into_router(&self, registry: Registry) -> Result<Router, RouterError> {
        let mut router = Router::with_config(self.settings.clone().unwrap_or_default())
            .with_registry(registry);
        self.apply(&mut router)?;
        Ok(router)
    }
}

fn apply_routes(router: &mut Router, routes: &[RouteEntry]) -> Result<(), RouterError> {
    for route in routes {
        router.map(route.methods.to_vec(), &route.pattern, named(&route.handler))?;
    }
    Ok(())
}

fn apply_groups(router: &mut Router, groups: &[GroupEntry]) -> Result<(), RouterError> {
    for group in groups {
        router.group(&group.prefix, |g| {
            apply_routes(g, &group.routes)?;
            apply_groups(g, &group.groups)
        })?;
    }
    Ok(())
}
