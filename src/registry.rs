//! String-keyed registry of handlers, controllers and middleware.
//!
//! Handlers declared as plain text (in a route manifest, or as
//! `"UserController::show"`) are resolved here when the route is registered,
//! so a bad reference fails at bootstrap rather than on the first request.
//!
//! Resolution order for a handler key:
//!
//! 1. an exact match among handlers registered with [`Registry::register_handler`]
//! 2. `Controller::action`, when `Controller` names a registered controller
//!    factory whose instances list `action`
//! 3. an [`EchoHandler`] if [`Registry::echo_unknown`] is enabled
//!
//! Anything else is [`RouterError::UnknownHandler`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::echo::EchoHandler;
use crate::error::RouterError;
use crate::handlers::{Controller, Handler};
use crate::message::{Request, Response};
use crate::middleware::Middleware;
use crate::params::Params;

type ControllerFactory = Arc<dyn Fn() -> Box<dyn Controller> + Send + Sync>;
type MiddlewareFactory = Arc<dyn Fn() -> Arc<dyn Middleware> + Send + Sync>;

/// Registry populated at bootstrap and consulted by the registration API.
#[derive(Clone, Default)]
pub struct Registry {
    handlers: HashMap<String, Arc<dyn Handler>>,
    controllers: HashMap<String, ControllerFactory>,
    middleware: HashMap<String, MiddlewareFactory>,
    echo_unknown: bool,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve unknown handler keys to an [`EchoHandler`] instead of failing.
    ///
    /// Used by the CLI to exercise a manifest without its application code.
    #[must_use]
    pub fn echo_unknown(mut self, enabled: bool) -> Self {
        self.echo_unknown = enabled;
        self
    }

    /// Bind a handler to a key. A later registration under the same key replaces it.
    pub fn register_handler<H>(&mut self, key: impl Into<String>, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        let key = key.into();
        debug!(key = %key, "Handler registered");
        self.handlers.insert(key, Arc::new(handler));
        self
    }

    /// Bind a controller factory to a name; actions resolve as `name::action`.
    pub fn register_controller<C, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        C: Controller + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(controller = %name, "Controller registered");
        self.controllers
            .insert(name, Arc::new(move || Box::new(factory()) as Box<dyn Controller>));
        self
    }

    /// Bind a middleware factory to a name for [`crate::Router::use_named`].
    pub fn register_middleware<M, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        M: Middleware + 'static,
        F: Fn() -> M + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(middleware = %name, "Middleware registered");
        self.middleware
            .insert(name, Arc::new(move || Arc::new(factory()) as Arc<dyn Middleware>));
        self
    }

    /// Resolve a handler key.
    ///
    /// # Errors
    ///
    /// [`RouterError::UnknownHandler`] when the key resolves to nothing.
    pub fn resolve_handler(&self, key: &str) -> Result<Arc<dyn Handler>, RouterError> {
        if let Some(handler) = self.lookup(key) {
            return Ok(handler);
        }
        if self.echo_unknown {
            return Ok(Arc::new(EchoHandler::new(key)));
        }
        Err(RouterError::UnknownHandler {
            name: key.to_string(),
        })
    }

    /// True when `key` resolves without falling back to echo.
    #[must_use]
    pub fn contains_handler(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    fn lookup(&self, key: &str) -> Option<Arc<dyn Handler>> {
        if let Some(handler) = self.handlers.get(key) {
            return Some(Arc::clone(handler));
        }
        let (controller, action) = key.split_once("::")?;
        let factory = self.controllers.get(controller)?;
        if !factory().actions().contains(&action) {
            return None;
        }
        Some(Arc::new(ControllerAction {
            factory: Arc::clone(factory),
            action: action.to_string(),
        }))
    }

    /// Instantiate a named middleware.
    ///
    /// # Errors
    ///
    /// [`RouterError::UnknownMiddleware`] when no factory has that name.
    pub fn resolve_middleware(&self, name: &str) -> Result<Arc<dyn Middleware>, RouterError> {
        self.middleware
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| RouterError::UnknownMiddleware {
                name: name.to_string(),
            })
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut handlers: Vec<_> = self.handlers.keys().collect();
        handlers.sort();
        let mut controllers: Vec<_> = self.controllers.keys().collect();
        controllers.sort();
        let mut middleware: Vec<_> = self.middleware.keys().collect();
        middleware.sort();
        f.debug_struct("Registry")
            .field("handlers", &handlers)
            .field("controllers", &controllers)
            .field("middleware", &middleware)
            .field("echo_unknown", &self.echo_unknown)
            .finish()
    }
}

/// A controller action bound by name; builds a fresh controller per call.
struct ControllerAction {
    factory: ControllerFactory,
    action: String,
}

impl Handler for ControllerAction {
    fn call(&self, req: &mut Request, params: &Params) -> anyhow::Result<Response> {
        let controller = (self.factory)();
        controller.invoke(&self.action, req, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::handler_fn;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static INSTANCES: AtomicUsize = AtomicUsize::new(0);

    struct Users;

    impl Controller for Users {
        fn actions(&self) -> &[&'static str] {
            &["show", "list"]
        }

        fn invoke(
            &self,
            action: &str,
            _req: &mut Request,
            params: &Params,
        ) -> anyhow::Result<Response> {
            match action {
                "show" => Ok(Response::text(200, format!("user {}", params.get("id").unwrap_or("?")))),
                "list" => Ok(Response::text(200, "users")),
                other => anyhow::bail!("unknown action {other}"),
            }
        }
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register_handler("health", handler_fn(|_req, _params| Ok(Response::text(200, "ok"))))
            .register_controller("Users", || {
                INSTANCES.fetch_add(1, Ordering::SeqCst);
                Users
            });
        registry
    }

    #[test]
    fn test_resolves_plain_handler() {
        let handler = registry().resolve_handler("health").unwrap();
        let res = handler.call(&mut Request::new("GET", "/"), &Params::new()).unwrap();
        assert_eq!(res.body_string(), "ok");
    }

    #[test]
    fn test_resolves_controller_action_with_fresh_instance_per_call() {
        let registry = registry();
        let handler = registry.resolve_handler("Users::show").unwrap();
        let before = INSTANCES.load(Ordering::SeqCst);
        let params: Params = [("id", "5")].into_iter().collect();
        let res = handler.call(&mut Request::new("GET", "/"), &params).unwrap();
        assert_eq!(res.body_string(), "user 5");
        handler.call(&mut Request::new("GET", "/"), &params).unwrap();
        assert!(INSTANCES.load(Ordering::SeqCst) >= before + 2);
    }

    #[test]
    fn test_unknown_action_and_controller_fail() {
        let registry = registry();
        assert_eq!(
            registry.resolve_handler("Users::delete").err(),
            Some(RouterError::UnknownHandler {
                name: "Users::delete".into()
            })
        );
        assert!(registry.resolve_handler("Posts::show").is_err());
        assert!(registry.resolve_handler("nope").is_err());
    }

    #[test]
    fn test_echo_unknown() {
        let registry = registry().echo_unknown(true);
        assert!(registry.resolve_handler("Posts::show").is_ok());
        assert!(!registry.contains_handler("Posts::show"));
        assert!(registry.contains_handler("Users::list"));
    }

    #[test]
    fn test_unknown_middleware() {
        assert_eq!(
            Registry::new().resolve_middleware("auth").err(),
            Some(RouterError::UnknownMiddleware {
                name: "auth".into()
            })
        );
    }
}
