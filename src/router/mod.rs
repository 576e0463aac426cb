//! # Router Module
//!
//! Registration-time half of the routing core: the rule table and the
//! builder that fills it.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling route patterns once, at registration
//! - Storing unique (method, pattern) -> handler rules in insertion order
//! - Composing group prefixes, including nested groups
//! - Collecting the global middleware queue and the 404/405 fallbacks
//!
//! ## Architecture
//!
//! Two phases, enforced by the types:
//!
//! 1. **Registration**: a mutable [`Router`] accepts `map`, `get`, ..., `group`,
//!    `use_middleware` and the fallback setters. Every registration call is
//!    all-or-nothing; a failed call leaves the table exactly as it was.
//!
//! 2. **Dispatch**: [`Router::build`] consumes the builder and returns an
//!    immutable [`crate::App`], which is `Send + Sync` and can be shared
//!    across request threads. Registering after the first dispatch is not
//!    expressible.
//!
//! ## Example
//!
//! ```rust
//! use waypoint::handlers::handler_fn;
//! use waypoint::{Request, Response, Router};
//!
//! let hello = handler_fn(|_req, params| {
//!     Ok(Response::text(200, format!("Hello {}", params.get("name").unwrap_or("world"))))
//! });
//!
//! let mut router = Router::new();
//! router.map(["GET", "post"], "/hello[/{name:\\w+}]", hello).unwrap();
//!
//! let app = router.build();
//! let res = app.dispatch(Request::new("GET", "/hello/Ann")).unwrap();
//! assert_eq!(res.body_string(), "Hello Ann");
//! ```
//!
//! ## Duplicates
//!
//! Registering an existing (method, pattern) pair fails with
//! [`crate::RouterError::DuplicateRoute`] and keeps the first handler.
//! Set [`crate::runtime_config::DuplicatePolicy::Overwrite`] to replace it
//! instead.

mod core;
mod table;

pub use core::{parse_method, IntoMethods, Router, SUPPORTED_METHODS};
pub use table::{Rule, RuleTable};
