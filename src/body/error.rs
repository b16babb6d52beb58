use std::fmt;
use std::io;

/// Error produced while draining or materializing a request body
#[derive(Debug)]
pub enum BodyError {
    /// The body was already drained once
    AlreadyConsumed,
    /// The body does not fit in a single in-memory buffer or exceeds the configured limit
    EntityTooLarge {
        /// Declared length, or the number of bytes seen when the limit was crossed
        size: u64,
    },
    /// The producer stopped early or sent more than it declared
    LengthMismatch {
        /// Length declared by the transport
        declared: u64,
        /// Bytes actually received
        received: u64,
    },
    /// The producer aborted the stream
    Aborted {
        /// Reason given by the producer
        reason: String,
    },
    /// Reading the blocking source failed
    Io(io::Error),
}

impl BodyError {
    /// `true` when the failure should be reported to the client as 413
    #[must_use]
    pub fn is_too_large(&self) -> bool {
        matches!(self, BodyError::EntityTooLarge { .. })
    }
}

impl fmt::Display for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyError::AlreadyConsumed => write!(f, "request body was already consumed"),
            BodyError::EntityTooLarge { size } => {
                write!(f, "request body of {size} bytes is too large to materialize")
            }
            BodyError::LengthMismatch { declared, received } => write!(
                f,
                "request body length mismatch: declared {declared} bytes, received {received}"
            ),
            BodyError::Aborted { reason } => write!(f, "request body aborted: {reason}"),
            BodyError::Io(err) => write!(f, "request body read failed: {err}"),
        }
    }
}

impl std::error::Error for BodyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BodyError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for BodyError {
    fn from(err: io::Error) -> Self {
        BodyError::Io(err)
    }
}

/// Error returned to the producer side of an externally-fed body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodySendError {
    /// The queue is at capacity; the chunk is handed back
    Full(bytes::Bytes),
    /// The consumer dropped the body; no more chunks will be read
    Closed,
}

impl fmt::Display for BodySendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodySendError::Full(chunk) => {
                write!(f, "body queue is full ({} byte chunk rejected)", chunk.len())
            }
            BodySendError::Closed => write!(f, "body consumer is gone"),
        }
    }
}

impl std::error::Error for BodySendError {}
