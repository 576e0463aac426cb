use std::time::Instant;

use tracing::{field, info_span};

use super::{Middleware, Next};
use crate::message::{Request, Response};

/// Opens a `request` span around the rest of the onion and records the
/// outcome on it.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn handle(&self, req: &mut Request, next: Next<'_>) -> anyhow::Result<Response> {
        let span = info_span!(
            "request",
            request_id = %req.id(),
            method = %req.method(),
            path = %req.path(),
            status = field::Empty,
            latency_us = field::Empty,
        );
        let _guard = span.enter();
        let start = Instant::now();

        let result = next.run(req);
        let latency_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        span.record("latency_us", latency_us);
        match &result {
            Ok(res) => {
                span.record("status", res.status);
                tracing::debug!(status = res.status, latency_us, "Request completed");
            }
            Err(err) => {
                tracing::error!(error = %err, latency_us, "Request failed");
            }
        }
        result
    }
}
