//! # Middleware Module
//!
//! Onion-model request pipeline.
//!
//! A [`Pipeline`] is an ordered queue of [`Middleware`] stages. Stage `i`
//! receives the request and a [`Next`] continuation bound to stage `i + 1`:
//!
//! ```text
//! A.before -> B.before -> terminal -> B.after -> A.after
//! ```
//!
//! Per request the application appends one terminal stage, derived from the
//! dispatch result, to a copy of the registered queue and runs it.
//!
//! ## Stock stages
//!
//! - [`AuthMiddleware`] - token gate, short-circuits with 401
//! - [`CorsMiddleware`] - answers preflights, injects CORS headers
//! - [`MetricsMiddleware`] - request counts, status classes, latency
//! - [`TracingMiddleware`] - `request` span around the inner layers

mod auth;
mod core;
mod cors;
mod metrics;
mod tracing;

pub use auth::{AuthMiddleware, AUTHENTICATED_ATTRIBUTE};
pub use core::{from_fn, Middleware, Next, Pipeline};
pub use cors::CorsMiddleware;
pub use metrics::MetricsMiddleware;
pub use tracing::TracingMiddleware;
