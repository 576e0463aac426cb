use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage; a name may appear more than once.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Outbound response built by handlers, fallbacks and middleware.
///
/// Fields are public so any stage can construct or adjust one freely; the
/// pipeline checks [`Response::is_valid`] on what the route handler returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Response {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// Response headers in insertion order
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body bytes
    pub body: Vec<u8>,
}

impl Response {
    /// An empty response with the given status
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    /// An empty `200 OK`
    #[must_use]
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// A `text/plain` response
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut res = Self::new(status);
        res.set_header("content-type", "text/plain; charset=utf-8");
        res.body = body.into().into_bytes();
        res
    }

    /// A `text/html` response
    #[must_use]
    pub fn html(status: u16, body: impl Into<String>) -> Self {
        let mut res = Self::new(status);
        res.set_header("content-type", "text/html; charset=utf-8");
        res.body = body.into().into_bytes();
        res
    }

    /// A JSON response with default headers
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        let mut res = Self::new(status);
        res.set_header("content-type", "application/json");
        res.body = body.to_string().into_bytes();
        res
    }

    /// Create an error response
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, &serde_json::json!({ "error": message }))
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// True when `status` is a code `http::StatusCode` accepts (100..=999).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        StatusCode::from_u16(self.status).is_ok()
    }

    /// Canonical reason phrase, if the status has one.
    #[must_use]
    pub fn reason(&self) -> Option<&'static str> {
        StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
    }

    /// Get the first header with this name
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a repeated header, in insertion order
    pub fn header_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add a header, keeping existing values with the same name
    pub fn append_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.push((Arc::from(name), value.into()));
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value.into()));
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Append bytes to the body
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) {
        self.body.extend_from_slice(chunk.as_ref());
    }

    /// Replace the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Body as UTF-8, lossily decoded
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
