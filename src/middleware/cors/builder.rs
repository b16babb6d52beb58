use http::HeaderName;
use std::sync::Arc;
use url::Url;

use super::policy::{CorsPolicy, PrivatePolicy, PublicPolicy, DEFAULT_ALLOWED_HEADERS};
use super::CorsConfigError;

#[derive(Debug)]
enum Access {
    Public,
    Private(Vec<String>),
}

/// Builder for the built-in CORS policies with a fluent API
///
/// # Example
///
/// ```rust
/// use brrtdispatch::middleware::CorsPolicyBuilder;
///
/// let policy = CorsPolicyBuilder::private(&["https://example.com", "https://api.example.com"])
///     .allowed_headers(&["Content-Type", "Authorization", "X-Custom-Header"])
///     .max_age(3600) // Cache preflight for 1 hour
///     .build()
///     .expect("Invalid CORS configuration");
/// assert_eq!(policy.max_age(), Some(3600));
/// ```
#[derive(Debug)]
pub struct CorsPolicyBuilder {
    access: Access,
    allowed_headers: Vec<String>,
    max_age: Option<u32>,
}

impl CorsPolicyBuilder {
    fn with_access(access: Access) -> Self {
        Self {
            access,
            allowed_headers: DEFAULT_ALLOWED_HEADERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_age: None,
        }
    }

    /// Policy granting every registered method to any origin
    ///
    /// Defaults: headers `["Content-Type", "Authorization"]`, no preflight caching.
    #[must_use]
    pub fn public() -> Self {
        Self::with_access(Access::Public)
    }

    /// Policy granting every registered method to the listed origins only
    ///
    /// # Arguments
    ///
    /// * `origins` - exact origins such as `https://example.com`, compared
    ///   case-insensitively
    #[must_use]
    pub fn private(origins: &[&str]) -> Self {
        Self::with_access(Access::Private(
            origins.iter().map(|s| s.to_string()).collect(),
        ))
    }

    /// Set the headers reported in `Access-Control-Allow-Headers`
    #[must_use]
    pub fn allowed_headers(mut self, headers: &[&str]) -> Self {
        self.allowed_headers = headers.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Set preflight cache duration
    ///
    /// Browsers cache preflight responses for this many seconds, reducing the number
    /// of OPTIONS requests.
    #[must_use]
    pub fn max_age(mut self, seconds: u32) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Build the policy
    ///
    /// # Errors
    ///
    /// - `CorsConfigError::EmptyWhitelist` for a private policy without origins
    /// - `CorsConfigError::InvalidOriginFormat` for an origin that does not parse as a
    ///   URL or is not a bare `scheme://host[:port]` origin
    /// - `CorsConfigError::InvalidHeaderName` for an invalid header name
    pub fn build(self) -> Result<Arc<dyn CorsPolicy>, CorsConfigError> {
        for header in &self.allowed_headers {
            if HeaderName::from_bytes(header.as_bytes()).is_err() {
                return Err(CorsConfigError::InvalidHeaderName {
                    header: header.clone(),
                });
            }
        }

        match self.access {
            Access::Public => Ok(Arc::new(PublicPolicy::new(
                self.allowed_headers,
                self.max_age,
            ))),
            Access::Private(origins) => {
                if origins.is_empty() {
                    return Err(CorsConfigError::EmptyWhitelist);
                }
                for origin in &origins {
                    if let Err(reason) = check_origin(origin) {
                        return Err(CorsConfigError::InvalidOriginFormat {
                            origin: origin.clone(),
                            reason,
                        });
                    }
                }
                Ok(Arc::new(PrivatePolicy::new(
                    origins,
                    self.allowed_headers,
                    self.max_age,
                )))
            }
        }
    }
}

/// Check that `origin` is a bare serialized origin: `scheme://host[:port]` exactly as
/// a browser sends it in the `Origin` header.
///
/// Returns the reason when it is not.
fn check_origin(origin: &str) -> Result<(), String> {
    let url = Url::parse(origin).map_err(|e| e.to_string())?;
    let serialized = url.origin().ascii_serialization();
    if serialized == origin.trim().to_ascii_lowercase() {
        Ok(())
    } else {
        Err(format!("expected the bare origin '{serialized}'"))
    }
}
