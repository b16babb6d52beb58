use http::StatusCode;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::ids::RequestId;

/// Failure that prevents the dispatcher from producing a response.
///
/// By the time one is returned the request and its body have been dropped. The
/// transport decides what to write; [`DispatchError::status_hint`] suggests a status.
#[derive(Debug)]
pub enum DispatchError {
    /// The handler failed with an internal fault
    Handler {
        /// Request that failed
        request_id: RequestId,
        /// Name of the endpoint whose handler failed
        endpoint: Arc<str>,
        /// The fault
        source: anyhow::Error,
    },
    /// The handler did not finish before the configured timeout
    Timeout {
        /// Request that timed out
        request_id: RequestId,
        /// Name of the endpoint whose handler timed out
        endpoint: Arc<str>,
        /// The timeout that expired
        timeout: Duration,
    },
    /// The request was cancelled while the handler ran
    Cancelled {
        /// Request that was cancelled
        request_id: RequestId,
    },
}

impl DispatchError {
    /// Status a transport should send if it still can
    #[must_use]
    pub fn status_hint(&self) -> StatusCode {
        match self {
            DispatchError::Handler { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            // Nobody is listening; 500 is only for logs and metrics.
            DispatchError::Cancelled { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Request the error belongs to
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        match self {
            DispatchError::Handler { request_id, .. }
            | DispatchError::Timeout { request_id, .. }
            | DispatchError::Cancelled { request_id } => *request_id,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Handler {
                request_id,
                endpoint,
                source,
            } => write!(f, "handler '{endpoint}' failed for request {request_id}: {source}"),
            DispatchError::Timeout {
                request_id,
                endpoint,
                timeout,
            } => write!(
                f,
                "handler '{endpoint}' timed out after {}ms for request {request_id}",
                timeout.as_millis()
            ),
            DispatchError::Cancelled { request_id } => {
                write!(f, "request {request_id} was cancelled")
            }
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Handler { source, .. } => Some(&**source),
            _ => None,
        }
    }
}
