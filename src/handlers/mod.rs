//! # Handlers Module
//!
//! The capabilities the routing core invokes at the end of the pipeline.
//!
//! - [`Handler`] - a route handler: `(request, params) -> response`
//! - [`Fallback`] - a not-found / method-not-allowed handler, given the
//!   pre-populated 404/405 response to decorate
//! - [`Controller`] - a group of named actions, addressed as `"Name::action"`
//!   through the [`crate::registry::Registry`]
//! - [`HtmlFallback`] - stock fallback giving 404/405 a small HTML page
//!
//! Without a fallback, 404 and 405 responses go out bare: status, plus the
//! `Allow` header for 405.
//!
//! Plain functions and closures implement [`Handler`] and [`Fallback`]
//! directly. Wrap closures in [`handler_fn`] / [`fallback_fn`] so their
//! argument and return types are inferred:
//!
//! ```rust
//! use waypoint::handlers::handler_fn;
//! use waypoint::{Response, Router};
//!
//! let mut router = Router::new();
//! router
//!     .get("/user/{id:\\d+}", handler_fn(|_req, params| {
//!         Ok(Response::text(200, format!("user {}", params.get("id").unwrap_or(""))))
//!     }))
//!     .unwrap();
//! ```

mod core;

pub use core::{
    fallback_fn, handler_fn, named, Controller, Fallback, Handler, HandlerRef, HtmlFallback,
    IntoHandlerRef, Named,
};
