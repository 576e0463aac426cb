//! # Dispatcher Module
//!
//! Resolves an incoming (method, path) pair against the frozen rule table.
//!
//! ## Overview
//!
//! [`Dispatcher::dispatch`] returns a tri-state [`DispatchResult`]:
//!
//! - `Found` - a rule for the requested method matched; carries the rule and
//!   the decoded path parameters
//! - `MethodNotAllowed` - the path matched rules, but only under other
//!   methods; carries those methods, deduplicated, in registration order
//! - `NotFound` - nothing matched the path
//!
//! Dispatch never fails. Undecodable paths and malformed methods (empty, or
//! not a valid HTTP token) are `NotFound`; a well-formed method no rule for
//! the path uses is `MethodNotAllowed`.
//!
//! ## Matching
//!
//! 1. Percent-decode the path, then split it on `/`
//! 2. Test the rules whose pattern has an alternative of that many segments,
//!    in registration order
//! 3. The first rule whose method equals the request method wins
//!
//! Overlapping patterns are therefore resolved by registration order: the
//! first registered rule that matches is the one dispatched to.
//!
//! ## Example
//!
//! ```rust
//! use waypoint::dispatcher::DispatchStatus;
//! use waypoint::handlers::handler_fn;
//! use waypoint::{Response, Router};
//!
//! let mut router = Router::new();
//! router.map(["GET", "POST"], "/", handler_fn(|_req, _params| Ok(Response::ok()))).unwrap();
//! let app = router.build();
//!
//! let result = app.resolve("PUT", "/");
//! assert_eq!(result.status(), DispatchStatus::MethodNotAllowed);
//! assert_eq!(result.allowed_methods().unwrap().len(), 2);
//! assert!(result.params().is_err());
//! ```

mod core;

pub use core::{DispatchResult, DispatchStatus, Dispatcher};
