use http::Method;
use std::sync::Arc;
use std::time::Duration;

use crate::ids::RequestId;
use crate::server::{Request, Response};

/// What middleware can see of every request, including ones that never reach a
/// handler (404, 405, negotiation failures).
#[derive(Debug, Clone)]
pub struct RequestHead {
    /// Request identifier
    pub request_id: RequestId,
    /// HTTP method
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Name of the selected endpoint, once negotiation picked one
    pub endpoint: Option<Arc<str>>,
}

/// Hooks run around handler execution.
///
/// `before` runs after negotiation picked an endpoint and may short-circuit with its
/// own response. `after` runs on every response the dispatcher produces, including
/// short-circuits and error statuses.
pub trait Middleware: Send + Sync {
    /// Inspect the request; returning a response skips the handler
    fn before(&self, _head: &RequestHead, _req: &Request) -> Option<Response> {
        None
    }

    /// Observe or adjust the final response
    fn after(&self, _head: &RequestHead, _res: &mut Response, _latency: Duration) {}
}
