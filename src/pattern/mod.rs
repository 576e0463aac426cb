//! # Pattern Module
//!
//! Compiles route pattern strings into [`RoutePattern`] values that the
//! dispatcher can match against request paths without re-parsing.
//!
//! ## Grammar
//!
//! - Segments are separated by `/`
//! - A literal segment matches verbatim: `/users`
//! - A parameter segment binds one path segment: `/users/{id}`
//! - A constraint restricts the captured text: `/users/{id:\d+}`
//!   (default constraint: one or more non-`/` characters)
//! - Literal text and parameters may share a segment: `/files/{name}.{ext:json|xml}`
//! - The pattern may end in an optional suffix, itself optionally nested:
//!   `/hello[/{name:\w+}]`, `/archive[/{year}[/{month}]]`
//!
//! ## Compilation
//!
//! Optional suffixes are expanded into alternatives, shortest first:
//!
//! ```text
//! /archive[/{year}[/{month}]]
//!   -> /archive
//!   -> /archive/{year}
//!   -> /archive/{year}/{month}
//! ```
//!
//! Matching an alternative is a flat comparison per segment: literal equality,
//! or the parameter's constraint regex anchored to that single segment.
//!
//! ```rust
//! use waypoint::pattern::compile;
//!
//! let pattern = compile(r"/hello[/{name:\w+}]").unwrap();
//! assert!(pattern.match_path("/hello").unwrap().is_empty());
//! assert_eq!(pattern.match_path("/hello/Ann").unwrap().get("name"), Some("Ann"));
//! assert!(pattern.match_path("/hello/").is_none());
//! ```

mod core;

pub use core::{compile, Alternative, RoutePattern, Segment, DEFAULT_CONSTRAINT};
