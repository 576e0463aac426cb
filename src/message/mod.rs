//! # Message Module
//!
//! Concrete request and response values passed through the pipeline.
//!
//! The routing core only needs a narrow view of HTTP messages: a method, a
//! target path, headers, a body, and an attribute bag middleware layers use to
//! hand data to each other (e.g. an authenticated-identity flag). Building
//! these from a socket and writing them back is the host server's job.

mod request;
mod response;

pub use request::{Request, REQUEST_ID_HEADER};
pub use response::{HeaderVec, Response, MAX_INLINE_HEADERS};
