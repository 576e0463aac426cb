use http::Method;

use super::{Middleware, Next};
use crate::message::{Request, Response};

/// CORS (Cross-Origin Resource Sharing) middleware
///
/// Answers preflight `OPTIONS` requests itself and adds the
/// `Access-Control-Allow-Origin` header to every other cross-origin response.
pub struct CorsMiddleware {
    allowed_origins: Vec<String>,
    allowed_headers: Vec<String>,
    allowed_methods: Vec<Method>,
}

impl CorsMiddleware {
    /// Create a CORS middleware with a specific configuration.
    ///
    /// An origin of `"*"` allows every origin.
    pub fn new(
        allowed_origins: Vec<String>,
        allowed_headers: Vec<String>,
        allowed_methods: Vec<Method>,
    ) -> Self {
        Self {
            allowed_origins,
            allowed_headers,
            allowed_methods,
        }
    }

    fn allow_origin<'a>(&self, origin: &'a str) -> Option<&'a str> {
        if self.allowed_origins.iter().any(|o| o == "*") {
            Some("*")
        } else if self.allowed_origins.iter().any(|o| o == origin) {
            Some(origin)
        } else {
            None
        }
    }
}

/// Permissive policy for development: every origin, common methods.
impl Default for CorsMiddleware {
    fn default() -> Self {
        Self::new(
            vec!["*".to_string()],
            vec!["Content-Type".to_string(), "Authorization".to_string()],
            vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
                Method::OPTIONS,
            ],
        )
    }
}

impl Middleware for CorsMiddleware {
    fn handle(&self, req: &mut Request, next: Next<'_>) -> anyhow::Result<Response> {
        let origin = req.header("origin").map(str::to_string);
        let preflight = req.method() == Method::OPTIONS.as_str()
            && req.header("access-control-request-method").is_some();

        let Some(origin) = origin else {
            return next.run(req);
        };
        let Some(allowed) = self.allow_origin(&origin).map(str::to_string) else {
            return next.run(req);
        };

        if preflight {
            let methods: Vec<&str> = self.allowed_methods.iter().map(Method::as_str).collect();
            let mut res = Response::new(204);
            res.set_header("access-control-allow-origin", allowed);
            res.set_header("access-control-allow-methods", methods.join(", "));
            res.set_header("access-control-allow-headers", self.allowed_headers.join(", "));
            return Ok(res);
        }

        let mut res = next.run(req)?;
        res.set_header("access-control-allow-origin", allowed);
        Ok(res)
    }
}
