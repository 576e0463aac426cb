//! Frozen application: rule table, dispatcher, middleware queue and fallbacks.
//!
//! Built once by [`crate::Router::build`] and then only read. One `App` can be
//! shared by reference (or behind an `Arc`) across request threads; each
//! [`App::dispatch`] call gets its own dispatch result, parameter map and
//! pipeline copy.

use http::Method;
use std::sync::Arc;
use tracing::debug;

use crate::dispatcher::{DispatchResult, Dispatcher};
use crate::error::RouterError;
use crate::handlers::Fallback;
use crate::message::{Request, Response};
use crate::middleware::{Middleware, Next, Pipeline};
use crate::router::{Rule, RuleTable};
use crate::runtime_config::RouterConfig;

#[derive(Clone, Default)]
struct Fallbacks {
    not_found: Option<Arc<dyn Fallback>>,
    method_not_allowed: Option<Arc<dyn Fallback>>,
}

pub struct App {
    dispatcher: Dispatcher,
    pipeline: Pipeline,
    fallbacks: Fallbacks,
    config: RouterConfig,
}

impl App {
    pub(crate) fn new(
        table: RuleTable,
        pipeline: Pipeline,
        not_found: Option<Arc<dyn Fallback>>,
        method_not_allowed: Option<Arc<dyn Fallback>>,
        config: RouterConfig,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(table, &config),
            pipeline,
            fallbacks: Fallbacks {
                not_found,
                method_not_allowed,
            },
            config,
        }
    }

    /// Resolve without running anything.
    #[must_use]
    pub fn resolve(&self, method: &str, path: &str) -> DispatchResult {
        self.dispatcher.dispatch(method, path)
    }

    /// Run `req` through the middleware queue and the terminal stage its
    /// dispatch result selects.
    ///
    /// # Errors
    ///
    /// Errors from middleware, handlers and fallbacks propagate unchanged.
    /// The core adds [`RouterError::HandlerContract`] when a handler or
    /// fallback returns an invalid status code.
    pub fn dispatch(&self, mut req: Request) -> anyhow::Result<Response> {
        let result = self.dispatcher.dispatch(req.method(), req.path());
        debug!(
            request_id = %req.id(),
            status = %result.status(),
            middleware = self.pipeline.len(),
            "Running pipeline"
        );
        let terminal = Arc::new(Terminal {
            result,
            fallbacks: self.fallbacks.clone(),
        });
        self.pipeline.with_terminal(terminal).execute(&mut req)
    }

    /// Rules in registration order.
    pub fn rules(&self) -> impl Iterator<Item = &Arc<Rule>> {
        self.dispatcher.table().iter()
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Print the rule table to stdout, one `METHOD pattern -> handler` per line.
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.dispatcher.table().len());
        for rule in self.rules() {
            println!("[route] {rule}");
        }
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("rules", &self.dispatcher.table().len())
            .field("pipeline", &self.pipeline)
            .field("config", &self.config)
            .finish()
    }
}

/// Last stage of a per-request pipeline, bound to one dispatch result.
struct Terminal {
    result: DispatchResult,
    fallbacks: Fallbacks,
}

impl Middleware for Terminal {
    fn handle(&self, req: &mut Request, _next: Next<'_>) -> anyhow::Result<Response> {
        match &self.result {
            DispatchResult::Found { rule, params } => {
                let response = rule.handler().call(req, params)?;
                check_status(&response, rule.handler_name())?;
                Ok(response)
            }
            DispatchResult::MethodNotAllowed { allowed } => {
                let mut response = Response::new(405);
                response.set_header("Allow", allow_header(allowed));
                fall_back(
                    req,
                    response,
                    allowed,
                    self.fallbacks.method_not_allowed.as_ref(),
                )
            }
            DispatchResult::NotFound => fall_back(
                req,
                Response::new(404),
                &[],
                self.fallbacks.not_found.as_ref(),
            ),
        }
    }
}

/// Hand the pre-populated 404/405 response to the configured fallback, or
/// return it untouched when there is none.
fn fall_back(
    req: &mut Request,
    response: Response,
    allowed: &[Method],
    fallback: Option<&Arc<dyn Fallback>>,
) -> anyhow::Result<Response> {
    let Some(fallback) = fallback else {
        return Ok(response);
    };
    let response = fallback.call(req, response, allowed)?;
    check_status(&response, "fallback")?;
    Ok(response)
}

fn allow_header(allowed: &[Method]) -> String {
    allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn check_status(response: &Response, handler: &str) -> Result<(), RouterError> {
    if response.is_valid() {
        Ok(())
    } else {
        Err(RouterError::HandlerContract {
            reason: format!(
                "'{handler}' returned status {}, which is not a valid HTTP status code",
                response.status
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{fallback_fn, handler_fn, HtmlFallback};
    use crate::router::Router;

    #[test]
    fn test_app_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<App>();
    }

    #[test]
    fn test_allow_header_is_comma_joined() {
        assert_eq!(allow_header(&[Method::GET, Method::POST]), "GET, POST");
        assert_eq!(allow_header(&[]), "");
    }

    #[test]
    fn test_invalid_status_is_a_contract_error() {
        let mut router = Router::new();
        router
            .get("/bad", handler_fn(|_req, _params| Ok(Response::new(42))))
            .unwrap();
        let err = router.build().dispatch(Request::new("GET", "/bad")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RouterError>(),
            Some(RouterError::HandlerContract { .. })
        ));
    }

    #[test]
    fn test_fallback_receives_prepopulated_405() {
        let mut router = Router::new();
        router
            .map(["GET", "POST"], "/", handler_fn(|_req, _params| Ok(Response::ok())))
            .unwrap();
        router.set_method_not_allowed_handler(fallback_fn(|_req, mut res, allowed| {
            res.write(format!("try one of {}", allowed.len()));
            Ok(res)
        }));
        let res = router.build().dispatch(Request::new("PUT", "/")).unwrap();
        assert_eq!(res.status, 405);
        assert_eq!(res.header("Allow"), Some("GET, POST"));
        assert_eq!(res.body_string(), "try one of 2");
    }

    #[test]
    fn test_unconfigured_fallback_returns_bare_response() {
        let mut router = Router::new();
        router
            .map(["GET", "POST"], "/", handler_fn(|_req, _params| Ok(Response::ok())))
            .unwrap();
        let app = router.build();

        let res = app.dispatch(Request::new("GET", "/x")).unwrap();
        assert_eq!(res.status, 404);
        assert!(res.headers.is_empty());
        assert!(res.body.is_empty());

        let res = app.dispatch(Request::new("PUT", "/")).unwrap();
        assert_eq!(res.status, 405);
        assert_eq!(res.headers.len(), 1);
        assert_eq!(res.header("Allow"), Some("GET, POST"));
        assert!(res.body.is_empty());
    }

    #[test]
    fn test_html_fallbacks_fill_in_bodies() {
        let mut router = Router::new();
        router.get("/", handler_fn(|_req, _params| Ok(Response::ok()))).unwrap();
        router
            .set_not_found_handler(HtmlFallback::not_found())
            .set_method_not_allowed_handler(HtmlFallback::method_not_allowed());
        let app = router.build();

        let res = app.dispatch(Request::new("GET", "/x")).unwrap();
        assert_eq!(res.body_string(), "<h1>404 Not Found</h1>");
        assert_eq!(res.header("content-type"), Some("text/html; charset=utf-8"));

        let res = app.dispatch(Request::new("DELETE", "/")).unwrap();
        assert_eq!(res.status, 405);
        assert_eq!(res.header("Allow"), Some("GET"));
        assert_eq!(res.body_string(), "<h1>405 Method Not Allowed</h1>");
    }
}
