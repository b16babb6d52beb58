use std::fmt;

/// CORS configuration error
///
/// Returned by `CorsPolicyBuilder::build()` when the configuration is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsConfigError {
    /// A private policy was built without any whitelisted origin
    EmptyWhitelist,
    /// Invalid origin format
    ///
    /// The origin string does not parse as a URL, or is not the bare
    /// `scheme://host[:port]` serialization a browser sends.
    InvalidOriginFormat {
        /// The invalid origin string
        origin: String,
        /// Why it was rejected
        reason: String,
    },
    /// An allowed header is not a valid HTTP header name
    InvalidHeaderName {
        /// The invalid header name
        header: String,
    },
}

impl fmt::Display for CorsConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorsConfigError::EmptyWhitelist => {
                write!(
                    f,
                    "CORS configuration error: A private policy needs at least one whitelisted origin."
                )
            }
            CorsConfigError::InvalidOriginFormat { origin, reason } => {
                write!(
                    f,
                    "CORS configuration error: Invalid origin format '{}': {}. \
                    Expected format: scheme://host:port (e.g., https://example.com)",
                    origin, reason
                )
            }
            CorsConfigError::InvalidHeaderName { header } => {
                write!(
                    f,
                    "CORS configuration error: '{}' is not a valid header name.",
                    header
                )
            }
        }
    }
}

impl std::error::Error for CorsConfigError {}
