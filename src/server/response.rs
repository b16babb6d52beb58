use bytes::Bytes;
use http::StatusCode;
use std::sync::Arc;

use crate::body::Body;

use super::headers::Headers;

/// Outbound body: either a buffer of known size or a stream the transport frames
/// as chunked unless the body declares a length.
#[derive(Debug)]
pub enum ResponseBody {
    /// Fully buffered body with a known length
    Sized(Bytes),
    /// Streamed body
    Chunked(Body),
}

impl ResponseBody {
    /// Length known before sending, if any
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        match self {
            ResponseBody::Sized(bytes) => Some(bytes.len() as u64),
            ResponseBody::Chunked(body) => body.content_length(),
        }
    }
}

/// A response ready for the transport.
#[derive(Debug)]
pub struct Response {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers, emitted in insertion order with their original casing
    pub headers: Headers,
    /// Optional body
    pub body: Option<ResponseBody>,
}

impl Response {
    /// Response with a status and no headers or body
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: None,
        }
    }

    /// 200 with a sized body
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK).with_body(body)
    }

    /// Set a header, replacing any previous value
    #[must_use]
    pub fn with_header(mut self, name: impl Into<Arc<str>>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach a sized body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(ResponseBody::Sized(body.into()));
        self
    }

    /// Attach a streamed body
    #[must_use]
    pub fn with_stream(mut self, body: Body) -> Self {
        self.body = Some(ResponseBody::Chunked(body));
        self
    }

    /// `true` when a body is attached
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Length of the attached body when known up front
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.body.as_ref().and_then(ResponseBody::content_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let res = Response::ok("{}").with_header("Content-Type", "application/json");
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.headers.get("content-type"), Some("application/json"));
        assert_eq!(res.content_length(), Some(2));
    }

    #[test]
    fn test_streamed_body_length_follows_body() {
        let (_tx, body) = Body::channel(None, 2);
        let res = Response::new(StatusCode::OK).with_stream(body);
        assert!(res.has_body());
        assert_eq!(res.content_length(), None);
        assert!(!Response::new(StatusCode::NO_CONTENT).has_body());
    }
}
