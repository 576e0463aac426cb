use serde_json::json;

use crate::handlers::Handler;
use crate::message::{Request, Response};
use crate::params::Params;

/// Stand-in handler: echoes back what it was dispatched with.
///
/// Lets a route manifest be exercised before the application code behind its
/// handler names exists.
#[derive(Debug, Clone)]
pub struct EchoHandler {
    name: String,
}

impl EchoHandler {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Handler for EchoHandler {
    fn call(&self, req: &mut Request, params: &Params) -> anyhow::Result<Response> {
        Ok(Response::json(
            200,
            &json!({
                "handler": self.name,
                "request_id": req.id(),
                "method": req.method(),
                "path": req.path(),
                "params": params,
                "query": req.query(),
                "body": req.body_str(),
            }),
        ))
    }
}
