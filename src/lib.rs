//! # waypoint
//!
//! **waypoint** is the routing and dispatch core of an HTTP micro-framework:
//! it resolves every incoming (method, path) pair to a handler, extracts path
//! parameters, and runs the request through an onion of middleware around
//! that handler.
//!
//! ## Overview
//!
//! Building request and response objects from a socket, and writing them back,
//! is the host server's job. waypoint takes a [`Request`] value and returns a
//! [`Response`] value; everything in between happens here:
//!
//! - Route patterns are compiled once, at registration
//! - Registration is all-or-nothing per call and fails fast on duplicates
//! - Dispatch returns `Found`, `MethodNotAllowed` or `NotFound`, never an error
//! - Middleware wraps the matched handler (or the 404/405 fallback) in
//!   before/after layers
//!
//! ## Architecture
//!
//! - **[`pattern`]** - Route pattern compiler (literals, `{name:constraint}`
//!   parameters, trailing optional segments)
//! - **[`router`]** - Rule table and the registration API (`map`, `get`, ...,
//!   `group`, `use_middleware`, fallbacks)
//! - **[`dispatcher`]** - Tri-state resolution of (method, path)
//! - **[`middleware`]** - Onion pipeline and stock stages
//! - **[`handlers`]** - `Handler`, `Fallback` and `Controller` capabilities
//! - **[`registry`]** - String-keyed handlers, controllers and middleware
//! - **[`manifest`]** - Route tables declared in YAML, TOML or JSON
//! - **[`runtime_config`]** - Environment-driven routing settings
//! - **[`logging`]** - `tracing` subscriber setup for binaries
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Host as Host server
//!     participant App
//!     participant Disp as Dispatcher
//!     participant MW as Middleware A..N
//!     participant T as Terminal stage
//!
//!     Host->>App: dispatch(request)
//!     App->>Disp: dispatch(method, path)
//!     Disp-->>App: Found / MethodNotAllowed / NotFound
//!     App->>MW: queue copy + terminal stage
//!     MW->>T: next.run(request)
//!     T-->>MW: handler response, or 404/405
//!     MW-->>App: response, after-layers applied
//!     App-->>Host: response
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use waypoint::handlers::handler_fn;
//! use waypoint::middleware::from_fn;
//! use waypoint::{Request, Response, Router};
//!
//! let mut router = Router::new();
//! router
//!     .get("/user/{id:\\d+}", handler_fn(|_req, params| {
//!         Ok(Response::text(200, format!("user {}", params.get("id").unwrap_or(""))))
//!     }))
//!     .unwrap();
//! router.group("/api", |api| {
//!     api.map(["GET", "POST"], "/items[/{page:\\d+}]", handler_fn(|_req, _params| {
//!         Ok(Response::ok())
//!     }))?;
//!     Ok(())
//! }).unwrap();
//! router.use_middleware(from_fn(|req, next| {
//!     let mut res = next.run(req)?;
//!     res.set_header("x-powered-by", "waypoint");
//!     Ok(res)
//! }));
//!
//! let app = router.build();
//!
//! let res = app.dispatch(Request::new("GET", "/user/42")).unwrap();
//! assert_eq!(res.body_string(), "user 42");
//! assert_eq!(res.header("x-powered-by"), Some("waypoint"));
//!
//! let res = app.dispatch(Request::new("DELETE", "/api/items")).unwrap();
//! assert_eq!(res.status, 405);
//! assert_eq!(res.header("Allow"), Some("GET, POST"));
//! ```
//!
//! ## Errors
//!
//! Registration returns [`RouterError`]. Dispatch returns
//! `anyhow::Result<Response>`: application errors raised by handlers or
//! middleware pass through unchanged, and contract violations detected by
//! the core are [`RouterError`]s recoverable with `downcast_ref`.
//!
//! ## Concurrency
//!
//! [`App`] is immutable and `Send + Sync`. Build it once during bootstrap and
//! share it (by reference or `Arc`) with every request thread.

pub mod app;
pub mod cli;
pub mod dispatcher;
pub mod echo;
pub mod error;
pub mod handlers;
pub mod ids;
pub mod logging;
pub mod manifest;
pub mod message;
pub mod middleware;
pub mod params;
pub mod pattern;
pub mod registry;
pub mod router;
pub mod runtime_config;

pub use app::App;
pub use dispatcher::{DispatchResult, DispatchStatus};
pub use error::RouterError;
pub use handlers::{named, Controller, Fallback, Handler};
pub use ids::RequestId;
pub use manifest::RouteManifest;
pub use message::{Request, Response};
pub use middleware::{Middleware, Next, Pipeline};
pub use params::Params;
pub use pattern::RoutePattern;
pub use registry::Registry;
pub use router::{Router, Rule};
pub use runtime_config::{DuplicatePolicy, RouterConfig};
