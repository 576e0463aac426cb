use http::Method;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use super::table::{Rule, RuleTable};
use crate::app::App;
use crate::error::RouterError;
use crate::handlers::{Fallback, Handler, HandlerRef, IntoHandlerRef};
use crate::middleware::{Middleware, Pipeline};
use crate::pattern::RoutePattern;
use crate::registry::Registry;
use crate::runtime_config::{DuplicatePolicy, RouterConfig};

/// The fixed set of methods a rule may be registered for, in `any()` order.
pub const SUPPORTED_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::HEAD,
    Method::OPTIONS,
];

/// Uppercase a method token and check it against [`SUPPORTED_METHODS`].
///
/// # Errors
///
/// [`RouterError::UnsupportedMethod`] for anything outside the set.
pub fn parse_method(token: &str) -> Result<Method, RouterError> {
    let upper = token.trim().to_uppercase();
    SUPPORTED_METHODS
        .iter()
        .find(|m| m.as_str() == upper)
        .cloned()
        .ok_or(RouterError::UnsupportedMethod { method: upper })
}

/// One or more method tokens, as accepted by [`Router::map`].
pub trait IntoMethods {
    fn into_methods(self) -> Vec<String>;
}

impl IntoMethods for &str {
    fn into_methods(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoMethods for String {
    fn into_methods(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoMethods for Method {
    fn into_methods(self) -> Vec<String> {
        vec![self.as_str().to_string()]
    }
}

impl IntoMethods for &[&str] {
    fn into_methods(self) -> Vec<String> {
        self.iter().map(|m| (*m).to_string()).collect()
    }
}

impl<const N: usize> IntoMethods for [&str; N] {
    fn into_methods(self) -> Vec<String> {
        self.iter().map(|m| (*m).to_string()).collect()
    }
}

impl<const N: usize> IntoMethods for &[&str; N] {
    fn into_methods(self) -> Vec<String> {
        self.iter().map(|m| (*m).to_string()).collect()
    }
}

impl IntoMethods for Vec<&str> {
    fn into_methods(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl IntoMethods for Vec<String> {
    fn into_methods(self) -> Vec<String> {
        self
    }
}

impl IntoMethods for &[Method] {
    fn into_methods(self) -> Vec<String> {
        self.iter().map(|m| m.as_str().to_string()).collect()
    }
}

/// Registration-time builder for the rule table, middleware queue and
/// fallbacks. Freeze it with [`Router::build`].
pub struct Router {
    table: RuleTable,
    group_prefix: String,
    middleware: Pipeline,
    not_found: Option<Arc<dyn Fallback>>,
    method_not_allowed: Option<Arc<dyn Fallback>>,
    registry: Registry,
    config: RouterConfig,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    #[must_use]
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            table: RuleTable::new(),
            group_prefix: String::new(),
            middleware: Pipeline::new(),
            not_found: None,
            method_not_allowed: None,
            registry: Registry::new(),
            config,
        }
    }

    /// Replace the registry named handlers and middleware resolve against.
    #[must_use]
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Replace the configuration. Affects rules registered afterwards.
    pub fn set_config(&mut self, config: RouterConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Prefix currently applied to patterns by enclosing [`Router::group`] calls.
    #[must_use]
    pub fn current_prefix(&self) -> &str {
        &self.group_prefix
    }

    /// Bind `handler` to `pattern` for each method in `methods`.
    ///
    /// Tokens are uppercased. The pattern (with the current group prefix
    /// prepended) is compiled once and shared by every rule this call adds.
    /// The call is all-or-nothing: when it fails, the table is unchanged.
    ///
    /// # Errors
    ///
    /// - [`RouterError::UnsupportedMethod`] for an unknown token, or no token at all
    /// - [`RouterError::PatternSyntax`] when the pattern does not compile
    /// - [`RouterError::UnknownHandler`] when a named handler does not resolve
    /// - [`RouterError::DuplicateRoute`] when an identity key is already bound
    ///   (or repeated within `methods`) and the policy is `Reject`
    pub fn map<M, H>(&mut self, methods: M, pattern: &str, handler: H) -> Result<&mut Self, RouterError>
    where
        M: IntoMethods,
        H: IntoHandlerRef,
    {
        let tokens = methods.into_methods();
        if tokens.is_empty() {
            return Err(RouterError::UnsupportedMethod {
                method: String::new(),
            });
        }
        let methods = tokens
            .iter()
            .map(|t| parse_method(t))
            .collect::<Result<Vec<_>, _>>()?;

        let full = format!("{}{}", self.group_prefix, pattern);
        let compiled = Arc::new(RoutePattern::compile(&full)?);
        let (handler, handler_name) = self.resolve(handler.into_handler_ref())?;

        let mut seen = HashSet::with_capacity(methods.len());
        for method in &methods {
            let repeated = !seen.insert(method.clone());
            let bound = self.table.contains(method, &full)
                && self.config.duplicate_policy == DuplicatePolicy::Reject;
            if repeated || bound {
                return Err(RouterError::DuplicateRoute {
                    method: method.to_string(),
                    pattern: full,
                });
            }
        }

        for method in methods {
            debug!(
                method = %method,
                pattern = %full,
                handler = %handler_name,
                "Route registered"
            );
            let rule = Rule::new(
                method,
                Arc::clone(&compiled),
                Arc::clone(&handler),
                handler_name.as_str(),
            );
            self.table.insert(rule, self.config.duplicate_policy)?;
        }
        Ok(self)
    }

    fn resolve(&self, handler: HandlerRef) -> Result<(Arc<dyn Handler>, String), RouterError> {
        match handler {
            HandlerRef::Direct { handler, label } => Ok((handler, label)),
            HandlerRef::Named(key) => {
                let handler = self.registry.resolve_handler(&key)?;
                Ok((handler, key))
            }
        }
    }

    pub fn get<H: IntoHandlerRef>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouterError> {
        self.map(Method::GET, pattern, handler)
    }

    pub fn post<H: IntoHandlerRef>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouterError> {
        self.map(Method::POST, pattern, handler)
    }

    pub fn put<H: IntoHandlerRef>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouterError> {
        self.map(Method::PUT, pattern, handler)
    }

    pub fn delete<H: IntoHandlerRef>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouterError> {
        self.map(Method::DELETE, pattern, handler)
    }

    pub fn patch<H: IntoHandlerRef>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouterError> {
        self.map(Method::PATCH, pattern, handler)
    }

    pub fn head<H: IntoHandlerRef>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouterError> {
        self.map(Method::HEAD, pattern, handler)
    }

    pub fn options<H: IntoHandlerRef>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouterError> {
        self.map(Method::OPTIONS, pattern, handler)
    }

    /// Bind `handler` for every supported method.
    pub fn any<H: IntoHandlerRef>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouterError> {
        self.map(&SUPPORTED_METHODS[..], pattern, handler)
    }

    /// Register the routes added by `builder` under `prefix`.
    ///
    /// Groups nest; the previous prefix is restored when `builder` returns,
    /// whether it succeeded, failed or panicked.
    ///
    /// ```rust
    /// use waypoint::handlers::handler_fn;
    /// use waypoint::{Response, Router};
    ///
    /// let mut router = Router::new();
    /// router
    ///     .group("/abc", |g| {
    ///         g.group("/def", |h| {
    ///             h.get("/x", handler_fn(|_req, _params| Ok(Response::ok())))?;
    ///             Ok(())
    ///         })?;
    ///         Ok(())
    ///     })
    ///     .unwrap();
    /// assert_eq!(router.rules().next().unwrap().pattern().source(), "/abc/def/x");
    /// ```
    ///
    /// # Errors
    ///
    /// Whatever `builder` returns.
    pub fn group<F>(&mut self, prefix: &str, builder: F) -> Result<&mut Self, RouterError>
    where
        F: FnOnce(&mut Router) -> Result<(), RouterError>,
    {
        let result = {
            let mut guard = PrefixGuard::push(self, prefix);
            builder(&mut *guard.router)
        };
        result.map(|()| self)
    }

    /// Append a stage to the global middleware queue.
    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Append a middleware instantiated from the registry by name.
    ///
    /// # Errors
    ///
    /// [`RouterError::UnknownMiddleware`] when the name is not registered.
    pub fn use_named(&mut self, name: &str) -> Result<&mut Self, RouterError> {
        let middleware = self.registry.resolve_middleware(name)?;
        debug!(middleware = %name, "Named middleware appended");
        self.middleware.push(middleware);
        Ok(self)
    }

    pub fn set_not_found_handler<F: Fallback + 'static>(&mut self, fallback: F) -> &mut Self {
        self.not_found = Some(Arc::new(fallback));
        self
    }

    pub fn set_method_not_allowed_handler<F: Fallback + 'static>(&mut self, fallback: F) -> &mut Self {
        self.method_not_allowed = Some(Arc::new(fallback));
        self
    }

    /// Registered rules in insertion order.
    pub fn rules(&self) -> impl Iterator<Item = &Arc<Rule>> {
        self.table.iter()
    }

    #[must_use]
    pub fn middleware_count(&self) -> usize {
        self.middleware.len()
    }

    /// Freeze the registration state into a dispatchable [`App`].
    #[must_use]
    pub fn build(self) -> App {
        let routes_summary: Vec<String> = self
            .table
            .iter()
            .take(10)
            .map(|r| format!("{} {}", r.method(), r.pattern().source()))
            .collect();
        info!(
            routes_count = self.table.len(),
            middleware_count = self.middleware.len(),
            routes_summary = ?routes_summary,
            "Routing table frozen"
        );
        App::new(
            self.table,
            self.middleware,
            self.not_found,
            self.method_not_allowed,
            self.config,
        )
    }
}

/// Extends the group prefix for one `group` call and truncates it back on drop.
struct PrefixGuard<'a> {
    router: &'a mut Router,
    previous_len: usize,
}

impl<'a> PrefixGuard<'a> {
    fn push(router: &'a mut Router, prefix: &str) -> Self {
        let previous_len = router.group_prefix.len();
        router.group_prefix.push_str(prefix);
        Self {
            router,
            previous_len,
        }
    }
}

impl Drop for PrefixGuard<'_> {
    fn drop(&mut self) {
        self.router.group_prefix.truncate(self.previous_len);
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("rules", &self.table.len())
            .field("group_prefix", &self.group_prefix)
            .field("middleware", &self.middleware)
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}
