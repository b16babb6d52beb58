use http::Method;
use std::sync::Arc;

use crate::body::Body;
use crate::media::MediaType;
use crate::router::ParamVec;

use super::headers::Headers;
use super::query::{parse_query, QueryParams, QueryParseError};

/// Query as handed over by the transport: still raw, or already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySource {
    /// Undecoded query string (without the leading `?`)
    Raw(String),
    /// Query the transport parsed itself
    Parsed(QueryParams),
}

impl QuerySource {
    /// Resolve into a [`QueryParams`] multimap.
    ///
    /// # Errors
    ///
    /// Propagates [`QueryParseError`] from parsing a raw query.
    pub fn into_params(self) -> Result<QueryParams, QueryParseError> {
        match self {
            QuerySource::Raw(raw) => parse_query(&raw),
            QuerySource::Parsed(params) => Ok(params),
        }
    }
}

impl Default for QuerySource {
    fn default() -> Self {
        QuerySource::Parsed(QueryParams::new())
    }
}

/// An inbound request as produced by the transport adapter, before routing.
#[derive(Debug)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Query string, raw or parsed
    pub query: QuerySource,
    /// Raw header list
    pub headers: Headers,
    /// Request body
    pub body: Body,
}

impl TransportRequest {
    /// Build from a request target such as `/pets/7?limit=10`.
    ///
    /// Everything after the first `?` becomes a raw query. The body starts empty.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, raw)) => (path, QuerySource::Raw(raw.to_string())),
            None => (target, QuerySource::default()),
        };
        Self {
            method,
            path: path.to_string(),
            query,
            headers: Headers::new(),
            body: Body::empty(),
        }
    }

    /// Append a header
    #[must_use]
    pub fn header(mut self, name: impl Into<Arc<str>>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replace the body
    #[must_use]
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Replace the query with an already parsed one
    #[must_use]
    pub fn query(mut self, query: QueryParams) -> Self {
        self.query = QuerySource::Parsed(query);
        self
    }
}

/// A routed and negotiated request, as seen by a handler.
#[derive(Debug)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Path parameters extracted by the router, in template order
    pub path_params: ParamVec,
    /// Query string multimap
    pub query: QueryParams,
    /// Request headers
    pub headers: Headers,
    /// Request body
    pub body: Body,
    /// Declared Content-Type, parsed during negotiation
    pub content_type: Option<MediaType>,
}

impl Request {
    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics when a name repeats at different depths.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get the last query value for `name`
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name)
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_splits_path_and_query() {
        let req = TransportRequest::new(Method::GET, "/pets/7?limit=10&tag=a");
        assert_eq!(req.path, "/pets/7");
        assert_eq!(req.query, QuerySource::Raw("limit=10&tag=a".to_string()));

        let params = req.query.into_params().unwrap();
        assert_eq!(params.get("limit"), Some("10"));
    }

    #[test]
    fn test_target_without_query() {
        let req = TransportRequest::new(Method::GET, "/pets").header("Accept", "*/*");
        assert_eq!(req.path, "/pets");
        assert!(req.query.into_params().unwrap().is_empty());
        assert_eq!(req.headers.get("accept"), Some("*/*"));
    }
}
