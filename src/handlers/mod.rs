//! Request handlers for the notes API.
//!
//! Handlers are pure functions from a request to a [`Response`]; the
//! host maps them onto its HTTP server and applies CORS. Each handler
//! takes only the access grant its function declaration carries, so a
//! handler cannot touch the table beyond what the stack granted it.

pub mod read;
pub mod write;

use crate::store::{ReadGrant, WriteGrant};

/// HTTP response with status, headers, and body.
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub(crate) fn json(status: u16, body: String) -> Self {
        Self {
            status,
            headers: vec![("content-type".into(), "application/json".into())],
            body: body.into_bytes(),
        }
    }

    pub(crate) fn text(status: u16, body: String) -> Self {
        Self {
            status,
            headers: vec![("content-type".into(), "text/plain; charset=utf-8".into())],
            body: body.into_bytes(),
        }
    }
}

/// Route an API request to its handler.
///
/// `path` is relative to the API root. Returns `None` when no declared
/// route matches, leaving the error response to the host.
pub fn dispatch(
    method: &str,
    path: &str,
    body: &[u8],
    reader: &ReadGrant,
    writer: &WriteGrant,
) -> Option<Response> {
    match (method, path) {
        ("GET", "/notes") => Some(read::handle(reader)),
        ("POST", "/notes") => Some(write::handle(body, writer)),
        _ => None,
    }
}
