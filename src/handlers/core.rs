use http::Method;
use std::sync::Arc;

use crate::message::{Request, Response};
use crate::params::Params;

/// A route handler.
pub trait Handler: Send + Sync {
    /// Produce the response for a matched request.
    ///
    /// # Errors
    ///
    /// Any error aborts the pipeline and propagates to the caller of
    /// [`crate::App::dispatch`].
    fn call(&self, req: &mut Request, params: &Params) -> anyhow::Result<Response>;
}

impl<F> Handler for F
where
    F: Fn(&mut Request, &Params) -> anyhow::Result<Response> + Send + Sync,
{
    fn call(&self, req: &mut Request, params: &Params) -> anyhow::Result<Response> {
        self(req, params)
    }
}

/// Handler invoked when dispatch finds no method-matching route.
///
/// `response` arrives pre-populated: status 404, or status 405 with an
/// `Allow` header. `allowed` is empty for 404.
pub trait Fallback: Send + Sync {
    fn call(
        &self,
        req: &mut Request,
        response: Response,
        allowed: &[Method],
    ) -> anyhow::Result<Response>;
}

impl<F> Fallback for F
where
    F: Fn(&mut Request, Response, &[Method]) -> anyhow::Result<Response> + Send + Sync,
{
    fn call(
        &self,
        req: &mut Request,
        response: Response,
        allowed: &[Method],
    ) -> anyhow::Result<Response> {
        self(req, response, allowed)
    }
}

/// Fallback that fills the pre-populated response with a one-line HTML page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtmlFallback {
    body: &'static str,
}

impl HtmlFallback {
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            body: "<h1>404 Not Found</h1>",
        }
    }

    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self {
            body: "<h1>405 Method Not Allowed</h1>",
        }
    }
}

impl Fallback for HtmlFallback {
    fn call(
        &self,
        _req: &mut Request,
        response: Response,
        _allowed: &[Method],
    ) -> anyhow::Result<Response> {
        Ok(response
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(self.body))
    }
}

/// A set of actions addressable as `"Controller::action"`.
///
/// Controllers are registered as factories; a fresh instance serves each call.
pub trait Controller: Send + Sync {
    /// Action names `invoke` accepts.
    fn actions(&self) -> &[&'static str];

    /// Run one action with the same contract as [`Handler::call`].
    fn invoke(&self, action: &str, req: &mut Request, params: &Params)
        -> anyhow::Result<Response>;
}

/// Pin a closure to the [`Handler`] signature.
pub fn handler_fn<F>(f: F) -> F
where
    F: Fn(&mut Request, &Params) -> anyhow::Result<Response> + Send + Sync + 'static,
{
    f
}

/// Pin a closure to the [`Fallback`] signature.
pub fn fallback_fn<F>(f: F) -> F
where
    F: Fn(&mut Request, Response, &[Method]) -> anyhow::Result<Response> + Send + Sync + 'static,
{
    f
}

/// A handler given by registry key, e.g. `"UserController::show"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Named(pub String);

/// Refer to a handler by registry key.
pub fn named(key: impl Into<String>) -> Named {
    Named(key.into())
}

/// A handler as passed to the registration API, before resolution.
#[derive(Clone)]
pub enum HandlerRef {
    /// A handler value, labelled for route listings
    Direct {
        handler: Arc<dyn Handler>,
        label: String,
    },
    /// A registry key, resolved when the route is registered
    Named(String),
}

impl std::fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerRef::Direct { label, .. } => f.debug_tuple("Direct").field(label).finish(),
            HandlerRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

impl From<Arc<dyn Handler>> for HandlerRef {
    fn from(handler: Arc<dyn Handler>) -> Self {
        HandlerRef::Direct {
            handler,
            label: "handler".to_string(),
        }
    }
}

/// Anything the registration API accepts as a handler.
pub trait IntoHandlerRef {
    fn into_handler_ref(self) -> HandlerRef;
}

impl<H: Handler + 'static> IntoHandlerRef for H {
    fn into_handler_ref(self) -> HandlerRef {
        HandlerRef::Direct {
            handler: Arc::new(self),
            label: short_type_name::<H>(),
        }
    }
}

impl IntoHandlerRef for Named {
    fn into_handler_ref(self) -> HandlerRef {
        HandlerRef::Named(self.0)
    }
}

impl IntoHandlerRef for HandlerRef {
    fn into_handler_ref(self) -> HandlerRef {
        self
    }
}

/// `my_app::handlers::show_user` -> `show_user`; closures keep their parent path.
fn short_type_name<T>() -> String {
    let full = std::any::type_name::<T>();
    let trimmed = full.trim_end_matches("::{{closure}}");
    let last = trimmed.rsplit("::").next().unwrap_or(trimmed);
    if trimmed.len() == full.len() {
        last.to_string()
    } else {
        format!("{last}::{{closure}}")
    }
}
