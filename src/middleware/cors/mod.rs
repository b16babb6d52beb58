//! CORS (Cross-Origin Resource Sharing) enforcement
//!
//! A [`CorsPolicy`] decides, per origin and route, which methods and request headers
//! are granted. When a policy is given to the
//! [`EndpointRegistry`](crate::registry::EndpointRegistry), building the registry:
//!
//! 1. synthesizes an OPTIONS endpoint for every route that has no OPTIONS endpoint of
//!    its own; it answers preflight requests with 204 and the granted methods,
//!    headers and origin
//! 2. wraps every real endpoint so that, after its handler ran, the response (or the
//!    status error) carries `Access-Control-Allow-Origin` when the endpoint's method
//!    is granted to the request origin
//!
//! The wrapped handler always runs. A denied origin simply gets no CORS headers, and
//! the browser enforces the rest.
//!
//! # Security
//!
//! - Origins are echoed back, never answered with `*`
//! - Every response carrying `Access-Control-Allow-Origin` also carries
//!   `Vary: Origin` so shared caches do not serve it to other origins
//!
//! # Usage
//!
//! ```rust
//! use brrtdispatch::middleware::CorsPolicyBuilder;
//! use brrtdispatch::registry::EndpointRegistry;
//!
//! let cors = CorsPolicyBuilder::private(&["https://example.com"])
//!     .max_age(600)
//!     .build()
//!     .expect("Invalid CORS configuration");
//! let registry = EndpointRegistry::new().with_cors(cors);
//! ```

mod builder;
mod error;
mod policy;
mod preflight;

pub use builder::CorsPolicyBuilder;
pub use error::CorsConfigError;
pub use policy::{AccessDecision, CorsPolicy, PrivatePolicy, PublicPolicy, DEFAULT_ALLOWED_HEADERS};
pub use preflight::{ALLOW_HEADERS, ALLOW_METHODS, ALLOW_ORIGIN, MAX_AGE};

pub(crate) use preflight::{CorsHandler, PreflightHandler};
