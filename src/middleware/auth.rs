use super::{Middleware, Next};
use crate::message::{Request, Response};

/// Request attribute set once the token check passes.
pub const AUTHENTICATED_ATTRIBUTE: &str = "authenticated";

/// Token gate: short-circuits with `401` unless a header carries the token.
///
/// On success the request is marked with the `authenticated` attribute so
/// inner layers and handlers can read the outcome.
pub struct AuthMiddleware {
    header: String,
    token: String,
}

impl AuthMiddleware {
    /// Check the `Authorization` header against `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_header("authorization", token)
    }

    /// Check an arbitrary header against `token`.
    pub fn with_header(header: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            token: token.into(),
        }
    }
}

impl Middleware for AuthMiddleware {
    fn handle(&self, req: &mut Request, next: Next<'_>) -> anyhow::Result<Response> {
        match req.header(&self.header) {
            Some(value) if value == self.token => {
                req.set_attribute(AUTHENTICATED_ATTRIBUTE, true);
                next.run(req)
            }
            _ => {
                tracing::debug!(
                    request_id = %req.id(),
                    path = %req.path(),
                    "Rejected unauthenticated request"
                );
                Ok(Response::error(401, "Unauthorized"))
            }
        }
    }
}
