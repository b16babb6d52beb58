use std::time::Duration;

use tracing::{debug, info, warn};

use super::{Middleware, RequestHead};
use crate::server::{Request, Response};

/// Logs one line per request with status and latency.
///
/// Fields land inside the dispatcher's `dispatch` span, so `request_id` is attached
/// by the subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, head: &RequestHead, req: &Request) -> Option<Response> {
        debug!(
            method = %head.method,
            path = %head.path,
            endpoint = head.endpoint.as_deref().unwrap_or("-"),
            content_type = ?req.content_type.as_ref().map(ToString::to_string),
            "Request received"
        );
        None
    }

    fn after(&self, head: &RequestHead, res: &mut Response, latency: Duration) {
        let status = res.status.as_u16();
        let latency_ms = latency.as_millis() as u64;
        let endpoint = head.endpoint.as_deref().unwrap_or("-");
        if res.status.is_server_error() {
            warn!(
                method = %head.method,
                path = %head.path,
                endpoint,
                status,
                latency_ms,
                "Request completed with server error"
            );
        } else {
            info!(
                method = %head.method,
                path = %head.path,
                endpoint,
                status,
                latency_ms,
                "Request completed"
            );
        }
    }
}
