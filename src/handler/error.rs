use http::StatusCode;
use std::fmt;
use std::sync::Arc;

use crate::body::BodyError;
use crate::server::Headers;

/// An application error that maps to an HTTP status.
///
/// The dispatcher turns it into a response with this status and these headers and
/// no body. The message only appears in logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusError {
    status: StatusCode,
    headers: Headers,
    message: Option<String>,
}

impl StatusError {
    /// Error with a status and no headers
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            message: None,
        }
    }

    /// Attach a header to the eventual response
    #[must_use]
    pub fn with_header(mut self, name: impl Into<Arc<str>>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach a diagnostic message (logged, never sent)
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// 400
    #[must_use]
    pub fn bad_request() -> Self {
        Self::new(StatusCode::BAD_REQUEST)
    }

    /// 404
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    /// 413
    #[must_use]
    pub fn payload_too_large() -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE)
    }

    /// The status to respond with
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Headers to attach to the response
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable headers, used by wrappers that decorate errors
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// The diagnostic message, if any
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Split into status and headers
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, Headers) {
        (self.status, self.headers)
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {message}", self.status),
            None => write!(f, "{}", self.status),
        }
    }
}

impl std::error::Error for StatusError {}

/// Failure returned by a handler
#[derive(Debug)]
pub enum HandlerError {
    /// Respond with this status and headers
    Status(StatusError),
    /// Unexpected fault; propagated to the dispatcher's caller
    Internal(anyhow::Error),
}

impl HandlerError {
    /// Wrap any error as an internal fault
    pub fn internal<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        HandlerError::Internal(err.into())
    }

    /// The status error, if this is one
    #[must_use]
    pub fn as_status(&self) -> Option<&StatusError> {
        match self {
            HandlerError::Status(err) => Some(err),
            HandlerError::Internal(_) => None,
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Status(err) => write!(f, "handler responded with {err}"),
            HandlerError::Internal(err) => write!(f, "handler failed: {err}"),
        }
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HandlerError::Status(err) => Some(err),
            HandlerError::Internal(err) => Some(&**err),
        }
    }
}

impl From<StatusError> for HandlerError {
    fn from(err: StatusError) -> Self {
        HandlerError::Status(err)
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        HandlerError::Internal(err)
    }
}

/// Oversized bodies become 413; every other body failure is internal.
impl From<BodyError> for HandlerError {
    fn from(err: BodyError) -> Self {
        if err.is_too_large() {
            HandlerError::Status(StatusError::payload_too_large().with_message(err.to_string()))
        } else {
            HandlerError::Internal(anyhow::Error::new(err))
        }
    }
}
