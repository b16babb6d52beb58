use http::StatusCode;
use std::fmt;

use crate::media::MediaType;

/// Why no endpoint of a group could serve the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    /// No endpoint consumes the declared Content-Type (415)
    UnsupportedMediaType {
        /// The declared Content-Type, if any
        content_type: Option<MediaType>,
    },
    /// No remaining endpoint produces an acceptable type (406)
    NotAcceptable,
}

impl NegotiationError {
    /// The status the dispatcher answers with
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            NegotiationError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            NegotiationError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
        }
    }
}

impl fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationError::UnsupportedMediaType {
                content_type: Some(content_type),
            } => write!(f, "no endpoint consumes '{content_type}'"),
            NegotiationError::UnsupportedMediaType { content_type: None } => {
                write!(f, "no endpoint accepts a request without Content-Type")
            }
            NegotiationError::NotAcceptable => {
                write!(f, "no endpoint produces an acceptable media type")
            }
        }
    }
}

impl std::error::Error for NegotiationError {}
