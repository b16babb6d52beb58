//! # Server Model Module
//!
//! Transport-facing request and response types.
//!
//! The crate does no network I/O. A transport adapter builds a [`TransportRequest`]
//! from the wire, hands it to the [`Dispatcher`](crate::dispatcher::Dispatcher) and
//! writes the returned [`Response`] back out. Between the two, handlers see a routed
//! and negotiated [`Request`].
//!
//! - [`Headers`] - ordered multimap with case-insensitive lookup
//! - [`QueryParams`] / [`parse_query`] - query multimap and its parser
//! - [`ResponseBody`] - sized buffer or streamed [`Body`](crate::body::Body)

mod headers;
mod query;
mod request;
mod response;

pub use headers::{HeaderVec, Headers, MAX_INLINE_HEADERS};
pub use query::{parse_query, QueryParams, QueryParseError};
pub use request::{QuerySource, Request, TransportRequest};
pub use response::{Response, ResponseBody};
