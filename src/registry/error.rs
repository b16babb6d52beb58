use std::fmt;

use crate::media::MediaTypeError;

use super::route::RouteError;

/// Error raised while declaring endpoints or building the endpoint table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Invalid route template or conflicting registration
    Route(RouteError),
    /// An endpoint declares an unparseable media type
    MediaType {
        /// Name of the endpoint
        endpoint: String,
        /// The parse failure
        source: MediaTypeError,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Route(err) => write!(f, "invalid route: {err}"),
            RegistryError::MediaType { endpoint, source } => {
                write!(f, "endpoint '{endpoint}' declares an invalid media type: {source}")
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Route(err) => Some(err),
            RegistryError::MediaType { source, .. } => Some(source),
        }
    }
}

impl From<RouteError> for RegistryError {
    fn from(err: RouteError) -> Self {
        RegistryError::Route(err)
    }
}
