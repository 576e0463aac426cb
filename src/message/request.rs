use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::response::HeaderVec;
use crate::ids::RequestId;

/// Header carrying a caller-supplied request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Inbound request as seen by middleware and handlers.
#[derive(Debug, Clone)]
pub struct Request {
    id: RequestId,
    method: String,
    path: String,
    query: Option<String>,
    headers: HeaderVec,
    body: Vec<u8>,
    attributes: HashMap<String, Value>,
}

impl Request {
    /// Create a request from a method and a request target (`/path?query`).
    pub fn new(method: impl Into<String>, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };
        Self {
            id: RequestId::new(),
            method: method.into(),
            path,
            query,
            headers: HeaderVec::new(),
            body: Vec::new(),
            attributes: HashMap::new(),
        }
    }

    /// Add a header. A parseable `x-request-id` also becomes the request id.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if name.eq_ignore_ascii_case(REQUEST_ID_HEADER) {
            self.id = RequestId::from_header_or_new(Some(&value));
        }
        self.headers.push((Arc::from(name), value));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Path component of the target, not yet percent-decoded.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Look up a decoded query parameter ("last write wins" on repeats).
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        query
            .split('&')
            .filter_map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                let k = urlencoding::decode(&k.replace('+', " ")).ok()?.into_owned();
                (k == name).then(|| {
                    urlencoding::decode(&v.replace('+', " "))
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| v.to_string())
                })
            })
            .last()
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as UTF-8, if it is valid UTF-8.
    #[must_use]
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Read a value a previous middleware layer stored on the request.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_is_split_into_path_and_query() {
        let req = Request::new("GET", "/search?q=rust+lang&page=2&q=final%21");
        assert_eq!(req.path(), "/search");
        assert_eq!(req.query(), Some("q=rust+lang&page=2&q=final%21"));
        assert_eq!(req.query_param("page").as_deref(), Some("2"));
        assert_eq!(req.query_param("q").as_deref(), Some("final!"));
        assert_eq!(req.query_param("missing"), None);
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let req = Request::new("GET", "/").with_header("Authorization", "secret");
        assert_eq!(req.header("authorization"), Some("secret"));
    }

    #[test]
    fn test_request_id_taken_from_header() {
        let id = RequestId::new();
        let req = Request::new("GET", "/").with_header("X-Request-Id", id.to_string());
        assert_eq!(req.id(), id);
    }

    #[test]
    fn test_attributes() {
        let mut req = Request::new("GET", "/");
        req.set_attribute("authenticated", true);
        assert_eq!(req.attribute("authenticated"), Some(&Value::Bool(true)));
        assert_eq!(req.remove_attribute("authenticated"), Some(Value::Bool(true)));
        assert!(req.attribute("authenticated").is_none());
    }
}
